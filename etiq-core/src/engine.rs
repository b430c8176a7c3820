//! # Motor de Extração — Orquestrador do Pipeline
//!
//! Conecta todos os estágios na ordem canônica:
//!
//! 1. **Tokenização canônica** (com espaços e offsets) — ou tokens fornecidos
//!    pelo chamador, vindos da camada de layout do documento.
//! 2. **Codificação de linhas** ([`RowEncoder`]): uma linha de features por
//!    token não-espaço, na mesma ordem.
//! 3. **Etiquetagem** ([`SequenceTagger`]): externa, intercambiável.
//! 4. **Sincronização + agrupamento + extração**: reconstrói entidades com
//!    offsets exatos no texto original.
//!
//! Tudo aqui é síncrono e puro em memória; cada invocação é dona das próprias
//! sequências, então o motor pode ser compartilhado entre threads (o lote usa
//! `rayon`). Não há retry: dessincronização é violação estrutural de contrato
//! e repetiria idêntica.

use rayon::prelude::*;
use tracing::debug;

use crate::cluster::Clusterer;
use crate::error::ExtractError;
use crate::extract::{Entity, EntityResolver, ExtractionPolicy, Extractor};
use crate::tagger::SequenceTagger;
use crate::token::{tokenize, Token};

/// Codifica um token canônico em uma linha de features para o etiquetador.
///
/// A codificação real (vetores de features por modelo) é externa a este
/// núcleo; o contrato é só "uma linha por token não-espaço, ordem preservada,
/// token na primeira coluna".
pub trait RowEncoder: Send + Sync {
    /// Produz a linha de features de um token.
    fn encode_row(&self, token: &Token) -> String;
}

/// Codificador padrão: a linha é o próprio texto do token.
pub struct TextRowEncoder;

impl RowEncoder for TextRowEncoder {
    fn encode_row(&self, token: &Token) -> String {
        token.text.clone()
    }
}

/// O motor de extração de entidades.
///
/// # Exemplo
///
/// ```rust
/// use etiq_core::{ConstantTagger, ExtractionEngine};
///
/// let engine = ExtractionEngine::new(Box::new(ConstantTagger::new("<substancia>")));
/// let entidades = engine.extract("Cloreto de sódio").unwrap();
/// assert_eq!(entidades.len(), 1);
/// assert_eq!(entidades[0].raw_text, "Cloreto de sódio");
/// ```
pub struct ExtractionEngine {
    tagger: Box<dyn SequenceTagger>,
    encoder: Box<dyn RowEncoder>,
    resolver: Option<Box<dyn EntityResolver>>,
    policy: ExtractionPolicy,
}

impl ExtractionEngine {
    /// Cria o motor com o backend de etiquetagem dado, codificador padrão,
    /// política canônica e sem resolução.
    pub fn new(tagger: Box<dyn SequenceTagger>) -> Self {
        Self {
            tagger,
            encoder: Box::new(TextRowEncoder),
            resolver: None,
            policy: ExtractionPolicy::canonical(),
        }
    }

    /// Substitui o codificador de linhas de features.
    pub fn with_encoder(mut self, encoder: Box<dyn RowEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Anexa o colaborador de resolução por entidade.
    pub fn with_resolver(mut self, resolver: Box<dyn EntityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Define a política de extração (canônica ou legada).
    pub fn with_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extrai entidades de um texto plano, tokenizando com o tokenizador de
    /// referência. Texto vazio retorna lista vazia, nunca erro.
    pub fn extract(&self, text: &str) -> Result<Vec<Entity>, ExtractError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let tokens = tokenize(text);
        self.extract_from_tokens(text, &tokens)
    }

    /// Extrai entidades a partir de tokens canônicos já produzidos (ex: pela
    /// camada de layout do documento). `source` deve ser o texto do qual os
    /// offsets dos tokens foram medidos.
    pub fn extract_from_tokens(
        &self,
        source: &str,
        tokens: &[Token],
    ) -> Result<Vec<Entity>, ExtractError> {
        let rows: Vec<String> = tokens
            .iter()
            .filter(|t| !t.is_whitespace() && !t.text.is_empty())
            .map(|t| self.encoder.encode_row(t))
            .collect();
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let labeled = self.tagger.label(&rows)?;

        // Invariante do contrato do etiquetador: nº de linhas não vazias da
        // saída == nº de linhas não vazias da entrada. Violação é falha do
        // etiquetador, não dessincronização deste núcleo.
        let produzidas = labeled.lines().filter(|l| !l.trim().is_empty()).count();
        let esperadas = rows.iter().filter(|r| !r.trim().is_empty()).count();
        if produzidas != esperadas {
            return Err(ExtractError::Tagger(format!(
                "o etiquetador produziu {produzidas} linhas rotuladas para {esperadas} linhas de entrada"
            )));
        }

        debug!(
            tokens = tokens.len(),
            linhas = produzidas,
            "sincronizando saída do etiquetador"
        );

        let clusters = Clusterer::new(&labeled, tokens).cluster()?;
        let mut extractor = Extractor::new().with_policy(self.policy);
        if let Some(resolver) = self.resolver.as_deref() {
            extractor = extractor.with_resolver(resolver);
        }
        Ok(extractor.entities_from_clusters(&clusters, source))
    }

    /// Extrai entidades de vários textos em paralelo. Cada texto tem seu
    /// próprio resultado: uma falha não contamina os demais.
    pub fn extract_batch(&self, texts: &[&str]) -> Vec<Result<Vec<Entity>, ExtractError>> {
        texts.par_iter().map(|text| self.extract(text)).collect()
    }
}
