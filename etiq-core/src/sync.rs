//! # Sincronizador — Alinhamento dos Dois Fluxos de Tokens
//!
//! Esta é a parte mais delicada do sistema. O etiquetador consome um fluxo
//! **filtrado** (sem espaços), mas todo consumidor precisa de offsets exatos no
//! fluxo **canônico** (com espaços e quebras). O sincronizador reconcilia as
//! duas visões, linha rotulada por linha rotulada:
//!
//! 1. Linha em branco → sentinela de fronteira de segmento; o cursor do fluxo
//!    canônico **não** avança.
//! 2. Linha com token → consome tokens canônicos até casar com o texto
//!    reportado, absorvendo espaços/quebras no caminho (eles entram no conjunto
//!    *portador* e ligam o resultado de volta aos offsets originais).
//! 3. Token canônico não-espaço que **não** casa → dessincronização: erro fatal
//!    com as posições dos dois fluxos. Nunca adivinhamos nem pulamos.
//!
//! Quando o fluxo de rótulos termina, tokens canônicos restantes ficam sem
//! consumir — conteúdo final não etiquetado não é erro.

use crate::error::ExtractError;
use crate::label::{parse_labeled_result, LabeledLine, ParsedLabel};
use crate::token::{is_newline_token, is_space_token, Token};

/// Quantidade de linhas/tokens exibidos de cada lado na janela de diagnóstico.
const CONTEXT_WINDOW: usize = 5;

/// Um item produzido pelo sincronizador.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent<'a> {
    /// Fronteira dura de segmento (linha em branco na saída do etiquetador).
    /// Consumidores reiniciam estado aqui (ex: por sentença).
    Boundary,
    /// Um token do etiquetador resolvido contra o fluxo canônico.
    Token(SyncedToken<'a>),
}

/// Um token do etiquetador já alinhado ao fluxo canônico.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedToken<'a> {
    /// Tokens *portadores*: a corrida contígua de tokens canônicos consumida
    /// para casar esta linha (o token casado mais os espaços absorvidos antes).
    pub tokens: &'a [Token],
    /// Texto do token como o etiquetador o reportou.
    pub text: String,
    /// Rótulo decodificado; `None` em linha malformada sem rótulo.
    pub label: Option<ParsedLabel>,
    /// Havia espaço absorvido antes do token casado.
    pub space_preceding: bool,
    /// Havia quebra de linha absorvida antes do token casado.
    pub newline_preceding: bool,
    /// Colunas de features re-serializadas, quando pedidas na construção.
    pub features: Option<String>,
}

impl SyncedToken<'_> {
    /// Offset inicial do conjunto portador (inclui espaço absorvido).
    pub fn carrier_start(&self) -> Option<usize> {
        self.tokens.first().map(|t| t.start)
    }

    /// Offset final do conjunto portador.
    pub fn carrier_end(&self) -> Option<usize> {
        self.tokens.last().map(|t| t.end)
    }
}

/// Iterador que produz [`SyncEvent`]s a partir da saída bruta do etiquetador e
/// do fluxo canônico de tokens que cobre a mesma região.
///
/// Após a primeira dessincronização o iterador se encerra — o erro é
/// estrutural e continuar só produziria lixo.
pub struct Synchronizer<'a> {
    lines: Vec<LabeledLine>,
    tokens: &'a [Token],
    line_pos: usize,
    token_pos: usize,
    failed: bool,
}

impl<'a> Synchronizer<'a> {
    /// Cria um sincronizador descartando as colunas de features.
    pub fn new(result: &str, tokens: &'a [Token]) -> Self {
        Self::with_features(result, tokens, false)
    }

    /// Cria um sincronizador, opcionalmente retendo as colunas de features de
    /// cada linha (necessário para re-serializar blocos de treinamento).
    pub fn with_features(result: &str, tokens: &'a [Token], keep_features: bool) -> Self {
        Self {
            lines: parse_labeled_result(result, keep_features),
            tokens,
            line_pos: 0,
            token_pos: 0,
            failed: false,
        }
    }

    /// Janela de contexto dos dois fluxos ao redor do ponto de falha, com uma
    /// seta na posição corrente de cada um.
    fn context_window(&self, line_pos: usize, token_pos: usize) -> String {
        let mut out = String::from("linhas rotuladas ±:\n");
        let lo = line_pos.saturating_sub(CONTEXT_WINDOW);
        let hi = (line_pos + CONTEXT_WINDOW + 1).min(self.lines.len());
        for i in lo..hi {
            let texto = match &self.lines[i] {
                LabeledLine::Blank => "<linha em branco>".to_string(),
                LabeledLine::Entry { token, .. } => format!("'{token}'"),
            };
            let seta = if i == line_pos { "-->" } else { "   " };
            out.push_str(&format!("{seta}\t{texto}\n"));
        }
        out.push_str("tokens canônicos ±:\n");
        let lo = token_pos.saturating_sub(CONTEXT_WINDOW * 2);
        let hi = (token_pos + CONTEXT_WINDOW * 2 + 1).min(self.tokens.len());
        for i in lo..hi {
            let seta = if i == token_pos { "-->" } else { "   " };
            out.push_str(&format!("{seta}\t{:?}\n", self.tokens[i].text));
        }
        out
    }
}

impl<'a> Iterator for Synchronizer<'a> {
    type Item = Result<SyncEvent<'a>, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.line_pos >= self.lines.len() {
            return None;
        }

        let line = self.lines[self.line_pos].clone();
        let line_pos = self.line_pos;
        self.line_pos += 1;

        let (token_text, label, features) = match line {
            LabeledLine::Blank => return Some(Ok(SyncEvent::Boundary)),
            LabeledLine::Entry {
                token,
                label,
                features,
            } => (token, label, features),
        };

        let carrier_start = self.token_pos;
        let mut space_preceding = false;
        let mut newline_preceding = false;

        while self.token_pos < self.tokens.len() {
            let canonical = &self.tokens[self.token_pos];
            self.token_pos += 1;

            if is_space_token(&canonical.text) {
                space_preceding = true;
            } else if is_newline_token(&canonical.text) {
                newline_preceding = true;
            } else if canonical.text.trim() == token_text {
                break;
            } else if canonical.text.is_empty() {
                // tolerado: artefato de tokenização, sem efeito
            } else {
                self.failed = true;
                let token_pos = self.token_pos - 1;
                return Some(Err(ExtractError::Desynchronized {
                    label_pos: line_pos,
                    token_pos,
                    label_token: token_text,
                    stream_token: canonical.text.clone(),
                    context: self.context_window(line_pos, token_pos),
                }));
            }
        }

        Some(Ok(SyncEvent::Token(SyncedToken {
            tokens: &self.tokens[carrier_start..self.token_pos],
            text: token_text,
            label: label.map(|l| ParsedLabel::parse(&l)),
            space_preceding,
            newline_preceding,
            features,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{concat_text, tokenize};

    fn so_tokens<'a>(
        eventos: impl Iterator<Item = Result<SyncEvent<'a>, ExtractError>>,
    ) -> Vec<SyncedToken<'a>> {
        eventos
            .map(|e| e.expect("sem dessincronização"))
            .filter_map(|e| match e {
                SyncEvent::Token(t) => Some(t),
                SyncEvent::Boundary => None,
            })
            .collect()
    }

    #[test]
    fn test_sincronizacao_basica_absorve_espaco() {
        let tokens = tokenize("This Figure");
        let saida = "This\t<paragraph>\nFigure\tI-<figure>";
        let resultado = so_tokens(Synchronizer::new(&saida, &tokens));

        assert_eq!(resultado.len(), 2);
        // Nenhum conjunto portador começa com espaço...
        assert!(!resultado[0].tokens[0].is_whitespace());
        // ...mas o segundo absorveu o espaço separador
        assert!(resultado[1].space_preceding);
        assert_eq!(concat_text(resultado[1].tokens), " Figure");
        assert_eq!(resultado[1].carrier_start(), Some(4));
        assert_eq!(resultado[1].carrier_end(), Some(11));
    }

    #[test]
    fn test_dessincronizacao_e_fatal_e_determinista() {
        // O etiquetador afirma "Foo", mas o próximo token não-espaço é "Bar"
        let tokens = tokenize("This Bar");
        let saida = "This\t<a>\nFoo\t<a>";
        let eventos: Vec<_> = Synchronizer::new(&saida, &tokens).collect();

        assert!(matches!(eventos[0], Ok(SyncEvent::Token(_))));
        match &eventos[1] {
            Err(ExtractError::Desynchronized {
                label_pos,
                token_pos,
                label_token,
                stream_token,
                context,
            }) => {
                assert_eq!(*label_pos, 1);
                assert_eq!(*token_pos, 2);
                assert_eq!(label_token, "Foo");
                assert_eq!(stream_token, "Bar");
                assert!(context.contains("-->"));
            }
            outro => panic!("esperava dessincronização, veio {outro:?}"),
        }
        // O iterador se encerra após a falha
        assert_eq!(eventos.len(), 2);
    }

    #[test]
    fn test_linha_em_branco_vira_fronteira_sem_avancar_cursor() {
        let tokens = tokenize("a b");
        let saida = "a\t<x>\n\nb\tI-<x>";
        let eventos: Vec<_> = Synchronizer::new(&saida, &tokens)
            .map(|e| e.expect("sem erro"))
            .collect();

        assert_eq!(eventos.len(), 3);
        assert_eq!(eventos[1], SyncEvent::Boundary);
        match &eventos[2] {
            SyncEvent::Token(t) => assert_eq!(t.text, "b"),
            _ => panic!("esperava token"),
        }
    }

    #[test]
    fn test_tokens_finais_ficam_sem_consumir() {
        // Conteúdo final não etiquetado não é erro
        let tokens = tokenize("a b c");
        let saida = "a\t<x>";
        let mut sync = Synchronizer::new(&saida, &tokens);
        assert!(sync.next().is_some());
        assert!(sync.next().is_none());
    }

    #[test]
    fn test_quebra_de_linha_absorvida_com_flag() {
        let tokens = tokenize("a\nb");
        let saida = "a\t<x>\nb\t<x>";
        let resultado = so_tokens(Synchronizer::new(&saida, &tokens));
        assert!(resultado[1].newline_preceding);
        assert!(!resultado[1].space_preceding);
    }

    #[test]
    fn test_linha_sem_rotulo_consome_cursor() {
        // Linha malformada: o cursor canônico avança, o rótulo fica ausente
        let tokens = tokenize("a b");
        let saida = "a\n b\t<x>";
        let resultado = so_tokens(Synchronizer::new(&saida, &tokens));
        assert_eq!(resultado.len(), 2);
        assert!(resultado[0].label.is_none());
        assert_eq!(resultado[1].text, "b");
        assert_eq!(resultado[1].carrier_end(), Some(3));
    }

    #[test]
    fn test_idempotencia_do_alinhamento() {
        // Rodar duas vezes sobre as mesmas entradas produz o mesmo alinhamento
        let tokens = tokenize("Sodium chloride em água");
        let saida = "Sodium\tI-<chemical>\nchloride\t<chemical>\nem\t<other>\nágua\tI-<chemical>";
        let a = so_tokens(Synchronizer::new(&saida, &tokens));
        let b = so_tokens(Synchronizer::new(&saida, &tokens));
        assert_eq!(a, b);
    }

    #[test]
    fn test_features_preservadas_na_sincronizacao() {
        let tokens = tokenize("a");
        let saida = "a\tCAP\t<x>";
        let resultado = so_tokens(Synchronizer::with_features(&saida, &tokens, true));
        assert_eq!(resultado[0].features.as_deref(), Some("a\tCAP"));
    }
}
