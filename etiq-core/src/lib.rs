//! # etiq-core — Reconciliação de Rótulos e Extração de Entidades
//!
//! Este crate implementa o núcleo de reconciliação entre a saída de um
//! etiquetador sequencial (que trabalha sobre linhas de features, **sem**
//! espaços) e o fluxo canônico de tokens com offsets do texto original. É a
//! peça que transforma "uma classe por linha" em entidades com posição exata
//! em bytes na fonte.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui por um pipeline linear, transformado estágio a estágio:
//!
//! 1.  **Entrada**: Texto bruto (String) ou tokens canônicos já medidos.
//! 2.  **Tokenização** ([`token`]): O texto é dividido em tokens preservando
//!     espaços, quebras de linha e offsets em bytes.
//! 3.  **Etiquetagem** ([`tagger`]): Um backend intercambiável rotula uma
//!     linha por token não-espaço (`token<TAB>rótulo`, marcador `I-` no
//!     início de cada entidade).
//! 4.  **Sincronização** ([`sync`]): O fluxo de rótulos é realinhado ao fluxo
//!     canônico, absorvendo os espaços que o etiquetador nunca viu.
//!     Dessincronização é erro fatal, com janela de contexto para diagnóstico.
//! 5.  **Agrupamento** ([`cluster`]): Tokens sincronizados viram clusters do
//!     tamanho de uma entidade (marcador de início e mudança de classe).
//! 6.  **Saída** ([`extract`]): Lista de [`Entity`] com offsets exatos,
//!     opcionalmente enriquecida por um colaborador de resolução.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use etiq_core::{ConstantTagger, ExtractionEngine};
//!
//! // 1. Instancia o motor com um backend de etiquetagem
//! let engine = ExtractionEngine::new(Box::new(ConstantTagger::new("<substancia>")));
//!
//! // 2. Executa a extração sobre o texto bruto
//! let entidades = engine.extract("Cloreto de sódio").unwrap();
//!
//! // 3. Cada entidade carrega tipo, texto e offsets em bytes na fonte
//! assert_eq!(entidades.len(), 1);
//! assert_eq!(entidades[0].entity_type, "<substancia>");
//! assert_eq!(entidades[0].raw_text, "Cloreto de sódio");
//! ```
//!
//! ## Módulos Principais
//!
//! - [`engine`]: Orquestrador principal que conecta todos os estágios.
//! - [`sync`]: Sincronização rótulo↔token, o coração do crate.
//! - [`registry`]: Uma instância de modelo por processo, com carga única.
//! - [`label`]: Convenções de rótulo (prefixo `I-`, classe de fundo).

pub mod cluster;
pub mod engine;
pub mod error;
pub mod extract;
pub mod label;
pub mod registry;
pub mod sync;
pub mod tagger;
pub mod token;

pub use cluster::{Cluster, Clusterer};
pub use engine::{ExtractionEngine, RowEncoder, TextRowEncoder};
pub use error::{ExtractError, ResolveError};
pub use extract::{Entity, EntityResolver, ExtractionPolicy, Extractor};
pub use registry::TaggerKind;
pub use sync::{SyncEvent, SyncedToken, Synchronizer};
pub use tagger::{ConstantTagger, SequenceTagger, TaggerModel, ViterbiTagger};
pub use token::{tokenize, Token};
