//! # Erros do Núcleo de Reconciliação
//!
//! A política de falhas segue duas regras simples:
//! - Violação estrutural do contrato entre os fluxos (dessincronização,
//!   etiquetador que muda a contagem de linhas) é **fatal e imediata** — repetir
//!   com as mesmas entradas não conserta nada, então não há retry.
//! - Falha do colaborador de resolução é registrada **na entidade afetada** e
//!   nunca invalida o lote (ver [`crate::extract`]).

use thiserror::Error;

/// Erros fatais do pipeline de extração.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// O token reportado pelo etiquetador não casa com o próximo token
    /// não-espaço do fluxo canônico. Carrega as posições dos dois fluxos e uma
    /// janela de contexto para diagnóstico; nunca é recuperado silenciosamente.
    #[error(
        "fluxos dessincronizados: linha rotulada {label_pos} ('{label_token}') \
         não casa com o token canônico {token_pos} ('{stream_token}')\n{context}"
    )]
    Desynchronized {
        /// Posição da linha na saída do etiquetador.
        label_pos: usize,
        /// Posição do token no fluxo canônico.
        token_pos: usize,
        /// Token que o etiquetador reportou.
        label_token: String,
        /// Token canônico encontrado no lugar.
        stream_token: String,
        /// Janela de contexto dos dois fluxos ao redor do ponto de falha.
        context: String,
    },

    /// Falha do backend de etiquetagem (modelo indisponível, decodificação,
    /// contagem de linhas violada). Propagada como está, sem retry.
    #[error("falha do etiquetador: {0}")]
    Tagger(String),

    /// Modelo pedido ao registro sem nunca ter sido carregado/registrado.
    #[error("modelo desconhecido no registro: '{0}'")]
    UnknownModel(String),

    /// Modelo com JSON inválido ou dimensões inconsistentes.
    #[error("modelo inválido: {0}")]
    InvalidModel(#[from] serde_json::Error),
}

/// Falha do colaborador de resolução sobre **uma** entidade.
///
/// Fica registrada na própria entidade ([`crate::extract::Entity::resolution_error`]);
/// uma entidade ruim não derruba o lote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("falha na resolução de '{raw_text}': {message}")]
pub struct ResolveError {
    /// Texto bruto da entidade que falhou.
    pub raw_text: String,
    /// Descrição da falha reportada pelo colaborador.
    pub message: String,
}
