//! # Registro de Modelos — Uma Instância por Modelo, Para Todo o Processo
//!
//! Modelos de etiquetagem são caros de construir; o registro garante que cada
//! um seja carregado **uma única vez**, sob um único lock, e compartilhado via
//! `Arc` entre todas as chamadas de extração concorrentes. Há um gancho
//! explícito de encerramento ([`close_all`]) — nada de globais com
//! double-checked locking espalhados por ponto de chamada.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ExtractError;
use crate::label::OTHER_LABEL;
use crate::tagger::{ConstantTagger, SequenceTagger, TaggerModel, ViterbiTagger};

/// Mapa global de modelos carregados em memória, chaveado pelo identificador.
static MODELS: Lazy<Mutex<HashMap<String, Arc<TaggerModel>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Obtém o guard do mapa, recuperando de poisoning (o conteúdo é um simples
/// cache, sempre consistente entrada a entrada).
fn models_guard() -> MutexGuard<'static, HashMap<String, Arc<TaggerModel>>> {
    match MODELS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Registra um modelo já construído, substituindo qualquer versão anterior
/// com o mesmo nome. Retorna a instância compartilhada.
pub fn register(model: TaggerModel) -> Arc<TaggerModel> {
    let compartilhado = Arc::new(model);
    models_guard().insert(compartilhado.name.clone(), Arc::clone(&compartilhado));
    compartilhado
}

/// Obtém um modelo já carregado; [`ExtractError::UnknownModel`] se ausente.
pub fn get(name: &str) -> Result<Arc<TaggerModel>, ExtractError> {
    models_guard()
        .get(name)
        .cloned()
        .ok_or_else(|| ExtractError::UnknownModel(name.to_string()))
}

/// Obtém o modelo `name`, carregando-o com `load` **apenas na primeira vez**.
///
/// O lock único cobre a verificação e a inserção, então chamadas concorrentes
/// pelo mesmo modelo nunca o carregam duas vezes.
pub fn get_or_load<F>(name: &str, load: F) -> Result<Arc<TaggerModel>, ExtractError>
where
    F: FnOnce() -> Result<TaggerModel, ExtractError>,
{
    let mut modelos = models_guard();
    if let Some(existente) = modelos.get(name) {
        debug!(modelo = name, "modelo já em memória");
        return Ok(Arc::clone(existente));
    }
    info!(modelo = name, "carregando modelo na memória");
    let carregado = Arc::new(load()?);
    modelos.insert(name.to_string(), Arc::clone(&carregado));
    Ok(carregado)
}

/// Gancho de encerramento: descarta todos os modelos carregados.
///
/// As instâncias em uso permanecem válidas (são `Arc`); apenas o cache é
/// esvaziado, e o próximo `get_or_load` recarrega do zero.
pub fn close_all() {
    let mut modelos = models_guard();
    let total = modelos.len();
    modelos.clear();
    info!(modelos_descartados = total, "registro de modelos encerrado");
}

/// Backend de etiquetagem selecionável por configuração.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaggerKind {
    /// Decodificação exata sobre um modelo do registro.
    Viterbi,
    /// Rótulo constante de fundo (diagnóstico/smoke test).
    Constant,
}

/// Constrói um backend do tipo pedido. `Viterbi` busca `model_name` no
/// registro; `Constant` ignora o nome e rotula tudo como fundo.
pub fn create_tagger(
    kind: TaggerKind,
    model_name: &str,
) -> Result<Box<dyn SequenceTagger>, ExtractError> {
    match kind {
        TaggerKind::Viterbi => Ok(Box::new(ViterbiTagger::new(get(model_name)?))),
        TaggerKind::Constant => Ok(Box::new(ConstantTagger::new(OTHER_LABEL))),
    }
}
