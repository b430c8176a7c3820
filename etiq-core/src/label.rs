//! # Vocabulário de Rótulos e Convenção de Fronteira
//!
//! Define o esquema de rotulagem consumido do etiquetador sequencial e as
//! funções que o decodificam sem ambiguidade.
//!
//! ## Convenção de Fronteira
//!
//! | Forma           | Significado                                          |
//! |-----------------|------------------------------------------------------|
//! | `I-<classe>`    | Início de uma entidade da classe `<classe>`          |
//! | `<classe>`      | Continuação da entidade corrente da mesma classe     |
//! | `<other>`       | Fundo — o token não pertence a nenhuma entidade      |
//!
//! O marcador de início é o que permite distinguir duas entidades **adjacentes
//! da mesma classe**: sem ele, "A" e "B" coladas virariam uma só.
//!
//! O rótulo de fundo `<other>` é uma classe como as demais no vocabulário
//! (distinguível **por valor**, não por ausência); quem decide que ele não gera
//! entidade é o extrator, não o parser.
//!
//! ## Formato da Saída do Etiquetador
//!
//! Linhas `token<TAB>rótulo` (colunas de features podem aparecer entre os
//! dois), separadas por `\n`; uma linha em branco marca fronteira de segmento
//! (ex: fim de sentença ou de exemplo).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefixo canônico de início de entidade (2 caracteres, fixo).
pub const START_ENTITY_PREFIX: &str = "I-";

/// Prefixos alternativos presentes no vocabulário legado de alguns modelos
/// antigos. O predicado principal [`is_entity_start`] **não** os reconhece;
/// eles seguem aqui apenas até confirmação em corpus de que estão mortos.
pub const LEGACY_START_PREFIXES: [&str; 2] = ["B-", "E-"];

/// Rótulo de fundo: o token não carrega semântica de entidade.
pub const OTHER_LABEL: &str = "<other>";

/// Separador de colunas nas linhas rotuladas (tab ou espaço).
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t ]").expect("padrão fixo válido"));

/// Remove o prefixo de início, se presente: `I-<citação>` → `<citação>`.
pub fn plain_label(label: &str) -> &str {
    label.strip_prefix(START_ENTITY_PREFIX).unwrap_or(label)
}

/// Verifica se o rótulo marca o início de uma entidade (prefixo canônico `I-`).
pub fn is_entity_start(label: &str) -> bool {
    label.starts_with(START_ENTITY_PREFIX)
}

/// Verifica se o rótulo usa um dos prefixos de início **legados** (`B-`/`E-`).
///
/// Mantido separado de propósito: nenhum caminho de produção consulta este
/// predicado; ele existe para que auditorias de corpus consigam medir se os
/// prefixos antigos ainda ocorrem antes de removermos o suporte de vez.
pub fn is_legacy_entity_start(label: &str) -> bool {
    LEGACY_START_PREFIXES.iter().any(|p| label.starts_with(p))
}

/// Rótulo decodificado: classe base + indicador de início.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLabel {
    /// Classe base, sem o prefixo de fronteira (ex: `<chemical>`, `<other>`).
    pub base: String,
    /// `true` se o rótulo bruto carregava o marcador de início `I-`.
    pub begins_entity: bool,
}

impl ParsedLabel {
    /// Decodifica um rótulo bruto vindo do etiquetador.
    pub fn parse(raw: &str) -> Self {
        Self {
            base: plain_label(raw).to_string(),
            begins_entity: is_entity_start(raw),
        }
    }

    /// Verifica se a classe base é o rótulo de fundo.
    pub fn is_background(&self) -> bool {
        self.base == OTHER_LABEL
    }

    /// Reconstrói o rótulo completo, com o prefixo se for início.
    pub fn full(&self) -> String {
        if self.begins_entity {
            format!("{}{}", START_ENTITY_PREFIX, self.base)
        } else {
            self.base.clone()
        }
    }
}

/// Uma linha da saída bruta do etiquetador, já decomposta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabeledLine {
    /// Linha em branco: sentinela de fronteira de segmento.
    Blank,
    /// Linha com token. O rótulo pode faltar em linhas malformadas — isso é
    /// tolerado (a posição avança, nenhuma entidade é emitida), não é erro.
    Entry {
        /// Texto do token, como o etiquetador o reportou.
        token: String,
        /// Rótulo bruto (última coluna), se presente.
        label: Option<String>,
        /// Colunas de features re-serializadas (tudo menos o rótulo), se pedidas.
        features: Option<String>,
    },
}

/// Decompõe a saída bruta do etiquetador em [`LabeledLine`]s.
///
/// Cada linha não vazia tem o token na primeira coluna e o rótulo na última;
/// com `keep_features = true`, as colunas intermediárias (incluindo o token)
/// são preservadas re-serializadas com tab — é o que permite reconstituir o
/// bloco de features de um cluster para dados de treinamento.
pub fn parse_labeled_result(result: &str, keep_features: bool) -> Vec<LabeledLine> {
    let mut lines: Vec<&str> = result.split('\n').collect();
    // Linhas vazias finais são artefato do join, não sentinelas
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    lines
        .into_iter()
        .map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return LabeledLine::Blank;
            }
            let fields: Vec<&str> = SEPARATOR.split(line).filter(|f| !f.is_empty()).collect();
            match fields.as_slice() {
                [] => LabeledLine::Blank,
                [token] => LabeledLine::Entry {
                    token: (*token).to_string(),
                    label: None,
                    features: None,
                },
                [token, .., label] => LabeledLine::Entry {
                    token: (*token).to_string(),
                    label: Some((*label).to_string()),
                    features: keep_features
                        .then(|| fields[..fields.len() - 1].join("\t")),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_label() {
        assert_eq!(plain_label("I-<citation>"), "<citation>");
        assert_eq!(plain_label("<citation>"), "<citation>");
        assert_eq!(plain_label(OTHER_LABEL), OTHER_LABEL);
    }

    #[test]
    fn test_is_entity_start() {
        assert!(is_entity_start("I-<chemical>"));
        assert!(!is_entity_start("<chemical>"));
        // Os prefixos legados NÃO são reconhecidos pelo predicado principal
        assert!(!is_entity_start("B-<chemical>"));
        assert!(!is_entity_start("E-<chemical>"));
    }

    #[test]
    fn test_prefixos_legados_apenas_no_predicado_legado() {
        assert!(is_legacy_entity_start("B-<chemical>"));
        assert!(is_legacy_entity_start("E-<chemical>"));
        assert!(!is_legacy_entity_start("I-<chemical>"));
    }

    #[test]
    fn test_parsed_label() {
        let p = ParsedLabel::parse("I-<title>");
        assert_eq!(p.base, "<title>");
        assert!(p.begins_entity);
        assert_eq!(p.full(), "I-<title>");

        let c = ParsedLabel::parse("<title>");
        assert!(!c.begins_entity);
        assert_eq!(c.full(), "<title>");

        // Fundo é uma classe por valor, não por ausência
        let o = ParsedLabel::parse(OTHER_LABEL);
        assert!(o.is_background());
        assert!(!ParsedLabel::parse("<title>").is_background());
    }

    #[test]
    fn test_parse_labeled_result_basico() {
        let saida = "Sodium\tI-<chemical>\nchloride\t<chemical>\n";
        let linhas = parse_labeled_result(saida, false);
        assert_eq!(linhas.len(), 2);
        assert_eq!(
            linhas[0],
            LabeledLine::Entry {
                token: "Sodium".to_string(),
                label: Some("I-<chemical>".to_string()),
                features: None,
            }
        );
    }

    #[test]
    fn test_parse_linha_em_branco_vira_sentinela() {
        let saida = "a\t<x>\n\nb\tI-<x>";
        let linhas = parse_labeled_result(saida, false);
        assert_eq!(linhas.len(), 3);
        assert_eq!(linhas[1], LabeledLine::Blank);
    }

    #[test]
    fn test_parse_linha_sem_rotulo() {
        // Linha malformada com só uma coluna: tolerada, rótulo ausente
        let linhas = parse_labeled_result("orfao", false);
        assert_eq!(
            linhas[0],
            LabeledLine::Entry {
                token: "orfao".to_string(),
                label: None,
                features: None,
            }
        );
    }

    #[test]
    fn test_parse_preserva_features() {
        let saida = "Sodium\tCAP\tNODIGIT\tI-<chemical>";
        let linhas = parse_labeled_result(saida, true);
        match &linhas[0] {
            LabeledLine::Entry {
                token,
                label,
                features,
            } => {
                assert_eq!(token, "Sodium");
                assert_eq!(label.as_deref(), Some("I-<chemical>"));
                assert_eq!(features.as_deref(), Some("Sodium\tCAP\tNODIGIT"));
            }
            _ => panic!("esperava Entry"),
        }
    }

    #[test]
    fn test_parse_separador_espaco() {
        // O separador aceita tab OU espaço, como os decodificadores emitem
        let linhas = parse_labeled_result("Sodium I-<chemical>", false);
        match &linhas[0] {
            LabeledLine::Entry { token, label, .. } => {
                assert_eq!(token, "Sodium");
                assert_eq!(label.as_deref(), Some("I-<chemical>"));
            }
            _ => panic!("esperava Entry"),
        }
    }
}
