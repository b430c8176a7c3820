//! # Extrator — De Clusters a Entidades com Offsets Exatos
//!
//! Converte os clusters do agrupador nas entidades finais, com `texto[início..fim]`
//! casando exatamente com o trecho da fonte, e invoca o colaborador de
//! resolução (ex: normalização de nome químico para estrutura) entidade a
//! entidade.
//!
//! ## Regras de offset
//!
//! - `start` = offset do primeiro token portador que não é espaço (o espaço
//!   separador absorvido pelo sincronizador fica de fora da entidade).
//! - `end` = offset logo após o último token portador não-espaço.
//! - `raw_text` = `fonte[start..end]` com quebras trocadas por espaço e
//!   aparado nas pontas.
//!
//! ## Política legada de fusão
//!
//! Historicamente existiu um segundo caminho de extração que caminhava os
//! fluxos brutos em linha e **fundia** na entidade aberta um token com marcador
//! de início da mesma classe quando não havia nenhum token entre os dois —
//! contradizendo a regra "marcador de início sempre abre". Esse comportamento
//! sobrevive aqui apenas como a flag nomeada
//! [`ExtractionPolicy::merge_adjacent_same_type`], desligada por padrão, até
//! que avaliação em corpus confirme se era compensação intencional de ruído do
//! etiquetador ou defeito.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::error::ResolveError;

/// Uma entidade extraída, ancorada por offsets exatos no texto original.
///
/// Entidades são efêmeras por chamada de extração; nada aqui retém tokens ou
/// clusters depois que a chamada retorna.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Classe da entidade (ex: `<chemical>`, `<title>`).
    pub entity_type: String,
    /// Trecho bruto coberto, com quebras normalizadas e pontas aparadas.
    pub raw_text: String,
    /// Offset de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Offset de byte final no texto original (exclusivo).
    pub end: usize,
    /// Atributos anexados pelo colaborador de resolução (ex: InChI, SMILES).
    pub attributes: HashMap<String, String>,
    /// Falha de resolução registrada nesta entidade, se houve. Uma entidade
    /// ruim não invalida o lote.
    pub resolution_error: Option<String>,
}

/// Flags nomeadas que reproduzem os comportamentos do caminho histórico de
/// extração em linha. O caminho canônico (padrão) deixa todas desligadas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionPolicy {
    /// Funde na entidade aberta um cluster da mesma classe cujo conjunto
    /// portador começa exatamente onde a entidade anterior termina, mesmo que
    /// o marcador `I-` tenha pedido uma entidade nova (fusão por adjacência
    /// zero do caminho legado).
    pub merge_adjacent_same_type: bool,
}

impl ExtractionPolicy {
    /// Política canônica: marcador de início sempre abre entidade nova.
    pub fn canonical() -> Self {
        Self::default()
    }

    /// Política do caminho legado em linha, com a fusão por adjacência.
    pub fn legacy_inline() -> Self {
        Self {
            merge_adjacent_same_type: true,
        }
    }
}

/// Colaborador externo de resolução por entidade (ex: nome químico →
/// estrutura canônica). Invocado de forma síncrona com o texto bruto aparado.
pub trait EntityResolver: Send + Sync {
    /// Resolve o texto bruto de uma entidade em atributos normalizados.
    fn resolve(&self, raw_text: &str) -> Result<HashMap<String, String>, ResolveError>;
}

/// Converte clusters em entidades finais, aplicando a política configurada e o
/// colaborador de resolução opcional.
#[derive(Default)]
pub struct Extractor<'r> {
    policy: ExtractionPolicy,
    resolver: Option<&'r dyn EntityResolver>,
}

impl<'r> Extractor<'r> {
    /// Extrator com a política canônica e sem resolução.
    pub fn new() -> Self {
        Self {
            policy: ExtractionPolicy::canonical(),
            resolver: None,
        }
    }

    /// Define a política de extração.
    pub fn with_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Anexa o colaborador de resolução por entidade.
    pub fn with_resolver(mut self, resolver: &'r dyn EntityResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Converte os clusters em entidades.
    ///
    /// `source` deve ser o mesmo texto do qual os tokens canônicos foram
    /// produzidos — os offsets dos clusters indexam diretamente nele.
    pub fn entities_from_clusters(&self, clusters: &[Cluster<'_>], source: &str) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();

        for cluster in clusters {
            if cluster.is_background() {
                continue;
            }
            let Some((start, end)) = cluster.byte_range() else {
                continue;
            };

            if self.policy.merge_adjacent_same_type {
                if let (Some(anterior), Some(carrier_start)) =
                    (entities.last_mut(), cluster.carrier_start())
                {
                    if anterior.entity_type == cluster.label() && anterior.end == carrier_start {
                        anterior.end = end;
                        anterior.raw_text = normalize_raw(&source[anterior.start..end]);
                        continue;
                    }
                }
            }

            entities.push(Entity {
                entity_type: cluster.label().to_string(),
                raw_text: normalize_raw(&source[start..end]),
                start,
                end,
                attributes: HashMap::new(),
                resolution_error: None,
            });
        }

        if let Some(resolver) = self.resolver {
            for entity in &mut entities {
                match resolver.resolve(&entity.raw_text) {
                    Ok(attrs) => entity.attributes = attrs,
                    Err(err) => entity.resolution_error = Some(err.to_string()),
                }
            }
        }

        entities
    }
}

/// Normaliza o trecho bruto: quebras viram espaço, pontas aparadas.
fn normalize_raw(s: &str) -> String {
    s.replace('\n', " ").trim().to_string()
}
