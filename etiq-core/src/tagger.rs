//! # Abstração do Etiquetador e Backends Intercambiáveis
//!
//! O núcleo de reconciliação não decodifica sequências: ele consome um
//! etiquetador pelo contrato [`SequenceTagger`] e confia em um único
//! invariante — **o número e a ordem das linhas não vazias da saída são
//! exatamente os das linhas de entrada**. Violação desse invariante é falha do
//! etiquetador ([`ExtractError::Tagger`]), não dessincronização do núcleo.
//!
//! ## Backends
//!
//! - [`ConstantTagger`]: rotula toda linha com um rótulo fixo. Trivial, mas
//!   valioso: smoke tests, medição de overhead do pipeline e modelos "tudo é
//!   uma classe" (ex: corpus inteiro de nomes químicos).
//! - [`ViterbiTagger`]: decodificação exata da melhor sequência sobre um
//!   modelo linear de emissões/transições carregado de JSON.
//!
//! Backends que embrulham modelos caros de carregar devem ser obtidos do
//! registro ([`crate::registry`]); a disciplina de pool (capacidade fixa,
//! aquisição bloqueante) é responsabilidade de quem chama, não deste núcleo.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::label::{OTHER_LABEL, START_ENTITY_PREFIX};

/// Contrato de um backend de etiquetagem sequencial.
///
/// `rows` traz uma linha de features por token não-espaço (o token é a
/// primeira coluna); uma linha vazia é separador de segmento e deve ser
/// preservada como linha em branco na saída. A saída é `token<TAB>rótulo` por
/// linha, unidas por `\n`.
pub trait SequenceTagger: Send + Sync {
    /// Rotula as linhas de entrada. Falhas de modelo/decodificação são fatais
    /// e não são repetidas automaticamente.
    fn label(&self, rows: &[String]) -> Result<String, ExtractError>;

    /// Gancho de liberação de recursos (modelos nativos, sessões).
    /// Implementação padrão: nada a fazer.
    fn close(&self) {}
}

/// Extrai o token (primeira coluna) de uma linha de features.
fn row_token(row: &str) -> &str {
    row.split(['\t', ' ']).next().unwrap_or("")
}

/// Backend trivial: um único rótulo constante para todas as linhas.
pub struct ConstantTagger {
    label_value: String,
}

impl ConstantTagger {
    /// Cria o backend com o rótulo fixo (ex: `"<chemical>"` ou `"I-<chemical>"`).
    pub fn new(label_value: impl Into<String>) -> Self {
        Self {
            label_value: label_value.into(),
        }
    }
}

impl SequenceTagger for ConstantTagger {
    fn label(&self, rows: &[String]) -> Result<String, ExtractError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            if row.trim().is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("{}\t{}", row_token(row), self.label_value));
            }
        }
        Ok(out.join("\n"))
    }
}

/// Modelo linear de sequência: emissões por token, transições entre classes.
///
/// É deliberadamente pequeno — o suficiente para decodificação exata via
/// programação dinâmica. Modelos reais (CRF treinado, redes neurais) entram
/// pelo mesmo contrato [`SequenceTagger`], como backends próprios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerModel {
    /// Identificador do modelo (chave no registro).
    pub name: String,
    /// Classes base, na ordem dos índices; deve incluir o rótulo de fundo.
    pub classes: Vec<String>,
    /// Scores de emissão por token (minúsculo) → um score por classe.
    pub emissions: HashMap<String, Vec<f64>>,
    /// Emissão usada para tokens fora do vocabulário.
    pub default_emission: Vec<f64>,
    /// Scores de transição: `transitions[anterior][seguinte]`.
    pub transitions: Vec<Vec<f64>>,
    /// Scores iniciais (primeiro token de cada segmento).
    pub initial: Vec<f64>,
}

impl TaggerModel {
    /// Carrega e valida um modelo serializado em JSON.
    pub fn from_json(data: &str) -> Result<Self, ExtractError> {
        let model: TaggerModel = serde_json::from_str(data)?;
        model.validate()
    }

    fn validate(self) -> Result<Self, ExtractError> {
        let n = self.classes.len();
        let dims_ok = n > 0
            && self.default_emission.len() == n
            && self.initial.len() == n
            && self.transitions.len() == n
            && self.transitions.iter().all(|linha| linha.len() == n)
            && self.emissions.values().all(|e| e.len() == n);
        if !dims_ok {
            return Err(ExtractError::Tagger(format!(
                "modelo '{}' com dimensões inconsistentes para {} classes",
                self.name, n
            )));
        }
        Ok(self)
    }

    fn emission(&self, token: &str) -> &[f64] {
        self.emissions
            .get(&token.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&self.default_emission)
    }
}

/// Backend de decodificação exata (Viterbi) sobre um [`TaggerModel`].
pub struct ViterbiTagger {
    model: Arc<TaggerModel>,
}

impl ViterbiTagger {
    /// Cria o backend sobre um modelo compartilhado (tipicamente vindo do
    /// registro, para não pagar o custo de carga por requisição).
    pub fn new(model: Arc<TaggerModel>) -> Self {
        Self { model }
    }

    /// Decodifica a melhor sequência de classes para um segmento de tokens.
    ///
    /// Programação dinâmica clássica: o melhor caminho até o token `i` com a
    /// classe `t` depende só do melhor caminho até `i-1` → `O(N × T²)`.
    fn decode(&self, tokens: &[&str]) -> Vec<usize> {
        let n_tokens = tokens.len();
        let n_classes = self.model.classes.len();
        if n_tokens == 0 {
            return Vec::new();
        }

        // viterbi[t] = melhor score acumulado para a classe t no token corrente
        let mut viterbi: Vec<f64> = vec![f64::NEG_INFINITY; n_classes];
        let mut backptr: Vec<Vec<usize>> = vec![vec![0usize; n_classes]; n_tokens];

        // === Inicialização (token 0) ===
        let emissao = self.model.emission(tokens[0]);
        for t in 0..n_classes {
            viterbi[t] = self.model.initial[t] + emissao[t];
        }

        // === Recursão ===
        for i in 1..n_tokens {
            let emissao = self.model.emission(tokens[i]);
            let mut novo = vec![f64::NEG_INFINITY; n_classes];
            for t in 0..n_classes {
                let mut melhor_score = f64::NEG_INFINITY;
                let mut melhor_anterior = 0;
                for anterior in 0..n_classes {
                    let score = viterbi[anterior] + self.model.transitions[anterior][t];
                    if score > melhor_score {
                        melhor_score = score;
                        melhor_anterior = anterior;
                    }
                }
                novo[t] = melhor_score + emissao[t];
                backptr[i][t] = melhor_anterior;
            }
            viterbi = novo;
        }

        // === Backtracking ===
        let mut melhor = best_in_slice(&viterbi);
        let mut sequencia = vec![0usize; n_tokens];
        sequencia[n_tokens - 1] = melhor;
        for i in (0..n_tokens - 1).rev() {
            melhor = backptr[i + 1][melhor];
            sequencia[i] = melhor;
        }
        sequencia
    }

    /// Emite as linhas rotuladas de um segmento, com o marcador de início no
    /// primeiro token de cada corrida de classe (o fundo nunca leva marcador).
    fn emit_segment(&self, tokens: &[&str], out: &mut Vec<String>) {
        let sequencia = self.decode(tokens);
        let mut anterior: Option<usize> = None;
        for (tok, &classe) in tokens.iter().zip(sequencia.iter()) {
            let base = &self.model.classes[classe];
            let rotulo = if base != OTHER_LABEL && anterior != Some(classe) {
                format!("{START_ENTITY_PREFIX}{base}")
            } else {
                base.clone()
            };
            out.push(format!("{tok}\t{rotulo}"));
            anterior = Some(classe);
        }
    }
}

impl SequenceTagger for ViterbiTagger {
    fn label(&self, rows: &[String]) -> Result<String, ExtractError> {
        let mut out: Vec<String> = Vec::with_capacity(rows.len());
        let mut segmento: Vec<&str> = Vec::new();

        for row in rows {
            if row.trim().is_empty() {
                self.emit_segment(&segmento, &mut out);
                segmento.clear();
                // preserva a linha em branco como separador de segmento
                out.push(String::new());
            } else {
                segmento.push(row_token(row));
            }
        }
        self.emit_segment(&segmento, &mut out);

        Ok(out.join("\n"))
    }
}

/// Retorna o índice do máximo em um slice (0 se vazio).
fn best_in_slice(scores: &[f64]) -> usize {
    scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
