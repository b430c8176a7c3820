//! # Tokens Canônicos com Offsets Exatos
//!
//! Define a unidade atômica que todo o núcleo de reconciliação consome: o token
//! canônico, com sua posição exata (em bytes) no texto original. Ao contrário do
//! fluxo que alimenta o etiquetador estatístico (que é filtrado, sem espaços),
//! o fluxo canônico **preserva os tokens de espaço e de quebra de linha** — é
//! essa diferença que o sincronizador precisa absorver depois.
//!
//! ## Por que preservar espaços?
//!
//! Todo consumidor a jusante precisa de offsets exatos no texto **original e não
//! filtrado**. Se os espaços fossem descartados aqui, seria impossível
//! reconstruir `texto[início..fim]` de uma entidade sem adivinhar onde havia
//! separadores — e adivinhar é exatamente o que este núcleo se recusa a fazer.
//!
//! ## Exemplo
//!
//! ```rust
//! use etiq_core::token::tokenize;
//!
//! let tokens = tokenize("Cloreto de sódio");
//! let textos: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(textos, vec!["Cloreto", " ", "de", " ", "sódio"]);
//! assert_eq!(tokens[0].start, 0);
//! assert_eq!(tokens[0].end, 7);
//! ```

use serde::{Deserialize, Serialize};

/// Um token do fluxo canônico.
///
/// O `Token` mantém a referência exata de sua posição no texto original
/// (`start` e `end`, em bytes), o que é crucial para:
/// 1. Reconstruir o trecho exato de cada entidade via `texto[start..end]`.
/// 2. Diagnosticar dessincronizações apontando a posição precisa dos dois fluxos.
///
/// Metadados de layout (fonte, página, coordenadas) pertencem à camada de
/// extração física do documento; este núcleo só referencia o que precisa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// O texto do token (ex: "Cloreto", " ", ",").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

impl Token {
    /// Cria um token avulso. Útil principalmente em testes e adaptadores.
    pub fn new(text: impl Into<String>, start: usize, end: usize, index: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            index,
        }
    }

    /// Verifica se o token é puramente espaço em branco (espaço, tab, quebra).
    pub fn is_whitespace(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }
}

/// Verifica se o texto de um token é um espaço "horizontal" (espaço ou tab).
pub fn is_space_token(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_whitespace() && c != '\n' && c != '\r')
}

/// Verifica se o texto de um token é uma quebra de linha.
pub fn is_newline_token(text: &str) -> bool {
    matches!(text, "\n" | "\r" | "\r\n")
}

/// Concatena o texto de uma sequência de tokens, na ordem, sem separadores extras.
///
/// Como os tokens de espaço são preservados no fluxo canônico, a concatenação
/// reconstrói exatamente o trecho original coberto pela sequência.
pub fn concat_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Tokeniza um texto preservando espaços e quebras de linha como tokens.
///
/// Este é o tokenizador de referência para texto plano: sequências
/// alfanuméricas viram um token, cada caractere de espaço/quebra vira um token
/// próprio e cada pontuação vira um token isolado. Tokenizadores específicos de
/// idioma ou de layout físico vivem fora deste núcleo; qualquer um serve, desde
/// que produza tokens com offsets de byte corretos.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start = 0;
    let mut current_text = String::new();

    for (byte_pos, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if current_text.is_empty() {
                current_start = byte_pos;
            }
            current_text.push(ch);
        } else {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
            // Espaços, quebras e pontuações: um token por caractere
            push_token(
                &mut tokens,
                ch.to_string(),
                byte_pos,
                byte_pos + ch.len_utf8(),
            );
        }
    }
    flush_token(&mut tokens, &mut current_text, current_start, text.len());

    // Re-indexa os tokens
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Fecha o token acumulado e adiciona à lista (se não vazio)
fn flush_token(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            text: text.clone(),
            start,
            end,
            index: 0, // será atribuído depois
        });
        text.clear();
    }
}

fn push_token(tokens: &mut Vec<Token>, text: String, start: usize, end: usize) {
    tokens.push(Token {
        text,
        start,
        end,
        index: 0,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_preserva_espacos() {
        let tokens = tokenize("Sodium chloride");
        let textos: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(textos, vec!["Sodium", " ", "chloride"]);
        assert_eq!(tokens[0].start, 0);
        assert_eq!(tokens[0].end, 6);
        assert_eq!(tokens[1].start, 6);
        assert_eq!(tokens[2].start, 7);
        assert_eq!(tokens[2].end, 15);
    }

    #[test]
    fn test_tokenize_pontuacao_isolada() {
        let tokens = tokenize("ácido (2%)");
        let textos: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(textos, vec!["ácido", " ", "(", "2", "%", ")"]);
    }

    #[test]
    fn test_tokenize_offsets_utf8() {
        // "ácido" tem 6 bytes ('á' ocupa 2)
        let tokens = tokenize("ácido x");
        assert_eq!(tokens[0].end, 6);
        assert_eq!(&"ácido x"[tokens[2].start..tokens[2].end], "x");
    }

    #[test]
    fn test_tokenize_vazio() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_concat_reconstroi_trecho() {
        let texto = "a b\nc";
        let tokens = tokenize(texto);
        assert_eq!(concat_text(&tokens), texto);
    }

    #[test]
    fn test_classificacao_de_espacos() {
        assert!(is_space_token(" "));
        assert!(is_space_token("\t"));
        assert!(!is_space_token("\n"));
        assert!(is_newline_token("\n"));
        assert!(is_newline_token("\r\n"));
        assert!(!is_newline_token(" "));
        assert!(!is_space_token("a"));
        assert!(!is_space_token(""));
    }

    #[test]
    fn test_token_is_whitespace() {
        let tokens = tokenize("a b");
        assert!(!tokens[0].is_whitespace());
        assert!(tokens[1].is_whitespace());
    }
}
