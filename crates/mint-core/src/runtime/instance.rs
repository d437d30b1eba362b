//! Estado reconstruido de una instancia de flujo.
//!
//! El runtime no guarda estado mutable durable: la instancia se reconstruye
//! por replay lineal de los eventos, consumidos en orden. Esto hace
//! reanudable un flujo tras recargar el proceso sin re-pedir firmas por
//! pasos ya exitosos.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use mint_domain::Address;

use crate::errors::FlowError;
use crate::event::{FlowEvent, FlowEventKind};
use crate::step::{StepState, StepStatus};

/// Estado global de una instancia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStatus {
    Idle,
    Running,
    /// Un paso quedó varado esperando el modelo de lectura: el efecto
    /// on-chain existe, reanudar retoma la verificación.
    StepNeedsRetry,
    Succeeded,
    Failed,
}

impl FlowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStatus::Succeeded)
    }
}

/// Agregado request + lista de pasos + estado global, reconstruido de los
/// eventos persistidos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInstance {
    pub flow_id: Uuid,
    pub flow_name: String,
    pub account: Address,
    /// Request validado y normalizado, tal como se persistió. Inmutable:
    /// corregirlo exige iniciar un flujo nuevo.
    pub request: Value,
    pub steps: Vec<StepState>,
    pub status: FlowStatus,
}

impl FlowInstance {
    /// Índice del primer paso no exitoso, si queda alguno.
    pub fn cursor(&self) -> Option<usize> {
        self.steps.iter().position(|s| s.status != StepStatus::Succeeded)
    }

    /// Paso actual con su estado (índice, estado).
    pub fn current_step(&self) -> Option<(usize, &StepState)> {
        self.cursor().map(|i| (i, &self.steps[i]))
    }
}

/// Replay lineal: consume eventos en orden y reconstruye la instancia.
/// Devuelve `None` si el flujo no tiene `FlowInitialized`.
pub fn rebuild(flow_id: Uuid, events: &[FlowEvent]) -> Option<FlowInstance> {
    let mut instance: Option<FlowInstance> = None;

    for ev in events {
        match &ev.kind {
            FlowEventKind::FlowInitialized { flow,
                                             account,
                                             request,
                                             step_ids,
                                             .. } => {
                instance = Some(FlowInstance { flow_id,
                                               flow_name: flow.clone(),
                                               account: *account,
                                               request: request.clone(),
                                               steps: step_ids.iter().map(StepState::pending).collect(),
                                               status: FlowStatus::Running });
            }
            FlowEventKind::FlowResumed { step_ids, .. } => {
                if let Some(inst) = instance.as_mut() {
                    // La nueva resolución conserva por id el avance previo.
                    let prior = std::mem::take(&mut inst.steps);
                    inst.steps = step_ids.iter()
                                         .map(|id| {
                                             prior.iter()
                                                  .find(|s| &s.id == id)
                                                  .cloned()
                                                  .map(StepState::carried_over)
                                                  .unwrap_or_else(|| StepState::pending(id))
                                         })
                                         .collect();
                    inst.status = FlowStatus::Running;
                }
            }
            FlowEventKind::StepStarted { step_index, .. } => {
                if let Some(slot) = step_mut(&mut instance, *step_index) {
                    slot.started_at = Some(ev.ts);
                    slot.attempts += 1;
                }
            }
            FlowEventKind::StepSubmitted { step_index, tx_hash, .. } => {
                if let Some(slot) = step_mut(&mut instance, *step_index) {
                    slot.status = StepStatus::Submitted;
                    slot.tx_hash = Some(*tx_hash);
                }
            }
            FlowEventKind::StepConfirming { step_index, .. } => {
                if let Some(slot) = step_mut(&mut instance, *step_index) {
                    slot.status = StepStatus::Confirming;
                }
            }
            FlowEventKind::StepSucceeded { step_index, .. } => {
                if let Some(slot) = step_mut(&mut instance, *step_index) {
                    slot.status = StepStatus::Succeeded;
                    slot.finished_at = Some(ev.ts);
                }
            }
            FlowEventKind::StepFailed { step_index, error, .. } => {
                if let Some(slot) = step_mut(&mut instance, *step_index) {
                    slot.status = StepStatus::Failed;
                    slot.error = Some(error.clone());
                    slot.finished_at = Some(ev.ts);
                }
                if let Some(inst) = instance.as_mut() {
                    inst.status = FlowStatus::Failed;
                }
            }
            FlowEventKind::StepStalled { step_index, .. } => {
                // El paso queda en Confirming, no Failed: el efecto existe.
                if let Some(slot) = step_mut(&mut instance, *step_index) {
                    slot.status = StepStatus::Confirming;
                }
                if let Some(inst) = instance.as_mut() {
                    inst.status = FlowStatus::StepNeedsRetry;
                }
            }
            FlowEventKind::FlowCompleted { .. } => {
                if let Some(inst) = instance.as_mut() {
                    inst.status = FlowStatus::Succeeded;
                }
            }
        }
    }

    instance
}

fn step_mut(instance: &mut Option<FlowInstance>, index: usize) -> Option<&mut StepState> {
    instance.as_mut().and_then(|inst| inst.steps.get_mut(index))
}

/// Carga la instancia de un flujo persistido.
pub fn load(flow_id: Uuid, events: &[FlowEvent]) -> Result<FlowInstance, FlowError> {
    rebuild(flow_id, events).ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))
}
