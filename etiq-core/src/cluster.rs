//! # Agrupador — De Tokens Sincronizados a Clusters de Entidade
//!
//! Consome a saída do sincronizador e agrupa tokens consecutivos em clusters do
//! tamanho de uma entidade, usando identidade de classe e o marcador explícito
//! de início.
//!
//! ## Regra de Fronteira
//!
//! Um novo cluster começa quando:
//! - o rótulo carrega o marcador de início (`I-`), **mesmo que a classe se
//!   repita** — é isso que mantém distinguíveis duas entidades adjacentes da
//!   mesma classe; ou
//! - a classe base muda em relação ao cluster corrente; ou
//! - é o primeiro token da sequência ou o primeiro após uma sentinela de
//!   segmento (cobre etiquetadores que omitem o marcador de início).
//!
//! Linhas sem rótulo são puladas sem fechar o cluster corrente: o cursor de
//! offsets já avançou no sincronizador e nenhuma entidade é emitida para elas.
//!
//! Clusters da classe de fundo (`<other>`) **são** produzidos — quem filtra é o
//! extrator, que é o único a decidir o que vira entidade.

use crate::error::ExtractError;
use crate::sync::{SyncEvent, SyncedToken, Synchronizer};
use crate::token::Token;

/// Sequência ordenada de tokens sincronizados compartilhando uma classe.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster<'a> {
    label: String,
    items: Vec<SyncedToken<'a>>,
}

impl<'a> Cluster<'a> {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: Vec::new(),
        }
    }

    fn add(&mut self, item: SyncedToken<'a>) {
        self.items.push(item);
    }

    /// Classe base do cluster (ex: `<chemical>`).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Tokens sincronizados do cluster, na ordem.
    pub fn items(&self) -> &[SyncedToken<'a>] {
        &self.items
    }

    /// Verifica se o cluster pertence à classe de fundo.
    pub fn is_background(&self) -> bool {
        self.label == crate::label::OTHER_LABEL
    }

    /// Todos os tokens portadores do cluster, achatados e na ordem original
    /// (inclui os espaços/quebras absorvidos — reconstrói o trecho exato).
    pub fn concat_tokens(&self) -> Vec<&'a Token> {
        self.items.iter().flat_map(|i| i.tokens.iter()).collect()
    }

    /// Texto coberto pelo cluster, com os espaços interiores originais.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .flat_map(|i| i.tokens.iter())
            .map(|t| t.text.as_str())
            .collect()
    }

    /// Offset inicial do conjunto portador, incluindo espaço absorvido.
    pub fn carrier_start(&self) -> Option<usize> {
        self.items.first().and_then(|i| i.carrier_start())
    }

    /// Faixa de bytes da entidade: início no primeiro token portador que não é
    /// espaço (a convenção é que offsets começam depois do separador absorvido)
    /// e fim logo após o último token não-espaço.
    pub fn byte_range(&self) -> Option<(usize, usize)> {
        let start = self
            .items
            .iter()
            .flat_map(|i| i.tokens.iter())
            .find(|t| !t.is_whitespace() && !t.text.is_empty())
            .map(|t| t.start)?;
        let end = self
            .items
            .iter()
            .flat_map(|i| i.tokens.iter())
            .filter(|t| !t.is_whitespace() && !t.text.is_empty())
            .next_back()
            .map(|t| t.end)?;
        Some((start, end))
    }

    /// Re-serializa o bloco de features do cluster (uma linha por token), para
    /// reconstituir dados de treinamento. Linhas sem features são omitidas.
    pub fn feature_block(&self) -> String {
        self.items
            .iter()
            .filter_map(|i| i.features.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Agrupa a saída de um [`Synchronizer`] em [`Cluster`]s.
pub struct Clusterer<'a> {
    sync: Synchronizer<'a>,
}

impl<'a> Clusterer<'a> {
    /// Cria o agrupador a partir da saída bruta do etiquetador e do fluxo
    /// canônico de tokens.
    pub fn new(result: &str, tokens: &'a [Token]) -> Self {
        Self {
            sync: Synchronizer::new(result, tokens),
        }
    }

    /// Variante que retém as colunas de features de cada linha.
    pub fn with_features(result: &str, tokens: &'a [Token]) -> Self {
        Self {
            sync: Synchronizer::with_features(result, tokens, true),
        }
    }

    /// Cria o agrupador sobre um sincronizador já construído.
    pub fn from_synchronizer(sync: Synchronizer<'a>) -> Self {
        Self { sync }
    }

    /// Executa o agrupamento. A primeira dessincronização aborta tudo.
    pub fn cluster(mut self) -> Result<Vec<Cluster<'a>>, ExtractError> {
        let mut clusters: Vec<Cluster<'a>> = Vec::new();
        // Indica início de sequência/segmento, para o caso de o rótulo vir sem
        // o marcador de início
        let mut begin = true;

        for evento in &mut self.sync {
            match evento? {
                SyncEvent::Boundary => begin = true,
                SyncEvent::Token(item) => {
                    let Some(parsed) = item.label.clone() else {
                        // linha sem rótulo: não fecha nem abre cluster
                        continue;
                    };
                    let need_new = begin
                        || parsed.begins_entity
                        || clusters.last().map_or(true, |c| c.label() != parsed.base);
                    if need_new {
                        clusters.push(Cluster::new(parsed.base));
                    }
                    if let Some(atual) = clusters.last_mut() {
                        atual.add(item);
                    }
                    begin = false;
                }
            }
        }

        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn labels<'a>(clusters: &'a [Cluster<'a>]) -> Vec<&'a str> {
        clusters.iter().map(|c| c.label()).collect()
    }

    #[test]
    fn test_agrupa_por_classe() {
        let tokens = tokenize("Sodium chloride em água");
        let saida =
            "Sodium\tI-<chemical>\nchloride\t<chemical>\nem\t<other>\nágua\tI-<chemical>";
        let clusters = Clusterer::new(saida, &tokens).cluster().expect("sem erro");

        assert_eq!(
            labels(&clusters),
            vec!["<chemical>", "<other>", "<chemical>"]
        );
        assert_eq!(clusters[0].text(), "Sodium chloride");
        assert_eq!(clusters[0].items().len(), 2);
    }

    #[test]
    fn test_marcador_de_inicio_separa_adjacentes_da_mesma_classe() {
        // Duas entidades coladas, mesma classe: o marcador I- abre um novo
        // cluster mesmo sem mudança de classe
        let tokens = tokenize("A B");
        let saida = "A\tI-<chemical>\nB\tI-<chemical>";
        let clusters = Clusterer::new(saida, &tokens).cluster().expect("sem erro");

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].text(), "A");
        assert_eq!(clusters[1].text(), " B");
    }

    #[test]
    fn test_primeiro_token_sem_marcador_abre_cluster() {
        // Etiquetadores que omitem o I- inicial ainda produzem um cluster
        let tokens = tokenize("a b");
        let saida = "a\t<x>\nb\t<x>";
        let clusters = Clusterer::new(saida, &tokens).cluster().expect("sem erro");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].items().len(), 2);
    }

    #[test]
    fn test_sentinela_forca_fronteira() {
        let tokens = tokenize("a b");
        let saida = "a\t<x>\n\nb\t<x>";
        let clusters = Clusterer::new(saida, &tokens).cluster().expect("sem erro");
        // Mesma classe, sem marcador, mas a linha em branco separa os clusters
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_linha_sem_rotulo_nao_fecha_cluster() {
        let tokens = tokenize("a b c");
        let saida = "a\t<x>\nb\nc\t<x>";
        let clusters = Clusterer::new(saida, &tokens).cluster().expect("sem erro");
        // "b" é pulado; "a" e "c" seguem no mesmo cluster de classe <x>
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].items().len(), 2);
    }

    #[test]
    fn test_byte_range_pula_espaco_absorvido() {
        let tokens = tokenize("em Sodium chloride");
        let saida = "em\t<other>\nSodium\tI-<chemical>\nchloride\t<chemical>";
        let clusters = Clusterer::new(saida, &tokens).cluster().expect("sem erro");

        let quimico = &clusters[1];
        // O portador de "Sodium" inclui o espaço após "em", mas a faixa de
        // bytes começa no próprio "Sodium"
        assert_eq!(quimico.byte_range(), Some((3, 18)));
        assert_eq!(quimico.carrier_start(), Some(2));
    }

    #[test]
    fn test_dessincronizacao_propaga() {
        let tokens = tokenize("Bar");
        let saida = "Foo\t<x>";
        let err = Clusterer::new(saida, &tokens).cluster().unwrap_err();
        assert!(matches!(err, ExtractError::Desynchronized { .. }));
    }

    #[test]
    fn test_bloco_de_features() {
        let tokens = tokenize("a b");
        let saida = "a\tCAP\tI-<x>\nb\tNOCAP\t<x>";
        let clusters = Clusterer::with_features(saida, &tokens)
            .cluster()
            .expect("sem erro");
        assert_eq!(clusters[0].feature_block(), "a\tCAP\nb\tNOCAP");
    }
}
