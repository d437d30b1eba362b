//! Máquina de estados del runtime.
//!
//! Un `FlowRuntime` posee una instancia en vuelo: el request validado, la
//! lista de pasos resuelta, y el estado de cada paso. Ejecuta los pasos en
//! estricto orden secuencial (el `commit` del paso N jamás se invoca antes
//! de que el `verify` del paso N-1 haya resuelto con éxito) y persiste
//! cada transición en el `EventStore`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use mint_domain::Address;

use crate::errors::FlowError;
use crate::event::{EventStore, FlowEvent, FlowEventKind};
use crate::flow::declaration::definition_hash;
use crate::flow::{FlowDeclaration, StepRegistry};
use crate::hashing::hash_value;
use crate::model::{FlowContext, FlowEnv};
use crate::runtime::instance::{load, FlowInstance, FlowStatus};
use crate::step::{StepState, StepStatus};

pub struct FlowRuntime<D: FlowDeclaration, S: EventStore> {
    declaration: Arc<D>,
    registry: StepRegistry<D::Request>,
    store: S,
    ctx: FlowContext<D::Request>,
    steps: Vec<StepState>,
    status: FlowStatus,
    initialized: bool,
}

impl<D: FlowDeclaration, S: EventStore> FlowRuntime<D, S> {
    /// Crea una instancia nueva a partir de un request crudo. La validación
    /// ocurre acá, antes de cualquier efecto: un request mal formado jamás
    /// llega a tocar la cadena.
    pub fn new(declaration: D,
               env: FlowEnv,
               store: S,
               account: Address,
               raw_request: &Value)
               -> Result<Self, FlowError> {
        let request = declaration.parse_request(raw_request)?;
        let registry = declaration.steps();
        Ok(FlowRuntime { declaration: Arc::new(declaration),
                         registry,
                         store,
                         ctx: FlowContext::new(Uuid::new_v4(), account, request, env),
                         steps: Vec::new(),
                         status: FlowStatus::Idle,
                         initialized: false })
    }

    /// Rehidrata una instancia persistida (p. ej. tras recargar la página).
    /// Los pasos ya exitosos no vuelven a pedir firma; un paso con hash
    /// enviado retoma directamente en `verify`.
    pub fn resume(declaration: D, env: FlowEnv, store: S, flow_id: Uuid) -> Result<Self, FlowError> {
        let events = store.list(flow_id);
        let instance = load(flow_id, &events)?;
        if instance.flow_name != declaration.name() {
            return Err(FlowError::UnknownFlow(format!("flow {} was declared as '{}', not '{}'",
                                                      flow_id, instance.flow_name,
                                                      declaration.name())));
        }
        let request: D::Request =
            serde_json::from_value(instance.request.clone()).map_err(|e| FlowError::Internal(e.to_string()))?;
        let registry = declaration.steps();
        Ok(FlowRuntime { declaration: Arc::new(declaration),
                         registry,
                         store,
                         ctx: FlowContext::new(flow_id, instance.account, request, env),
                         steps: instance.steps,
                         status: instance.status,
                         initialized: true })
    }

    pub fn flow_id(&self) -> Uuid {
        self.ctx.flow_id
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn steps(&self) -> &[StepState] {
        &self.steps
    }

    pub fn context(&self) -> &FlowContext<D::Request> {
        &self.ctx
    }

    /// Vista agregada de la instancia (para observadores/UI).
    pub fn instance(&self) -> FlowInstance {
        FlowInstance { flow_id: self.ctx.flow_id,
                       flow_name: self.declaration.name().to_string(),
                       account: self.ctx.account,
                       request: serde_json::to_value(&self.ctx.request).unwrap_or(Value::Null),
                       steps: self.steps.clone(),
                       status: self.status }
    }

    pub fn events(&self) -> Vec<FlowEvent> {
        self.store.list(self.ctx.flow_id)
    }

    /// Variante compacta de eventos, útil en demos y asserts.
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.events()
            .iter()
            .map(|e| match e.kind {
                FlowEventKind::FlowInitialized { .. } => "I",
                FlowEventKind::FlowResumed { .. } => "R",
                FlowEventKind::StepStarted { .. } => "S",
                FlowEventKind::StepSubmitted { .. } => "T",
                FlowEventKind::StepConfirming { .. } => "C",
                FlowEventKind::StepSucceeded { .. } => "F",
                FlowEventKind::StepFailed { .. } => "X",
                FlowEventKind::StepStalled { .. } => "L",
                FlowEventKind::FlowCompleted { .. } => "D",
            })
            .collect()
    }

    /// Cede el store (para inspección o para reanudar con otro runtime).
    pub fn into_store(self) -> S {
        self.store
    }

    /// Inicia o reanuda la ejecución.
    ///
    /// Re-resuelve la lista de pasos contra estado vivo de cadena en cada
    /// invocación: pasos cuyas precondiciones ya se satisficieron (p. ej.
    /// una allowance otorgada en una sesión anterior) desaparecen de la
    /// lista. Ejecuta desde el primer paso no exitoso hasta terminar o
    /// fallar (stop-on-failure).
    pub async fn start(&mut self) -> Result<FlowStatus, FlowError> {
        if self.status == FlowStatus::Succeeded {
            return Err(FlowError::FlowCompleted);
        }

        let step_ids = self.declaration.get_steps(&self.ctx).await?;
        if step_ids.is_empty() {
            return Err(FlowError::StepResolution("resolver returned an empty step list".into()));
        }
        for id in &step_ids {
            if !self.registry.contains(id) {
                return Err(FlowError::UnknownStep(id.clone()));
            }
        }

        let def_hash = definition_hash(self.declaration.name(), &step_ids);
        let prior = std::mem::take(&mut self.steps);
        self.steps = step_ids.iter()
                             .map(|id| {
                                 prior.iter()
                                      .find(|s| &s.id == id)
                                      .cloned()
                                      .map(StepState::carried_over)
                                      .unwrap_or_else(|| StepState::pending(id))
                             })
                             .collect();

        if !self.initialized {
            let request = serde_json::to_value(&self.ctx.request).map_err(|e| FlowError::Internal(e.to_string()))?;
            let request_hash = hash_value(&request);
            self.store.append_kind(self.ctx.flow_id,
                                   FlowEventKind::FlowInitialized { flow: self.declaration.name().to_string(),
                                                                    account: self.ctx.account,
                                                                    request,
                                                                    request_hash,
                                                                    definition_hash: def_hash,
                                                                    step_ids });
            self.initialized = true;
        } else {
            self.store.append_kind(self.ctx.flow_id,
                                   FlowEventKind::FlowResumed { definition_hash: def_hash,
                                                                step_ids });
        }

        self.status = FlowStatus::Running;
        self.run_to_completion().await?;
        Ok(self.status)
    }

    async fn run_to_completion(&mut self) -> Result<(), FlowError> {
        for index in 0..self.steps.len() {
            if self.steps[index].status == StepStatus::Succeeded {
                continue;
            }
            self.execute_step(index).await?;
        }
        self.complete_flow();
        Ok(())
    }

    async fn execute_step(&mut self, index: usize) -> Result<(), FlowError> {
        let step_id = self.steps[index].id.clone();
        let contract = self.registry
                           .get(&step_id)
                           .ok_or_else(|| FlowError::UnknownStep(step_id.clone()))?;

        // commit sólo si el paso nunca devolvió un handle: una transacción
        // enviada no se re-envía jamás.
        let tx_hash = match self.steps[index].tx_hash {
            Some(hash) => hash,
            None => {
                self.store.append_kind(self.ctx.flow_id,
                                       FlowEventKind::StepStarted { step_index: index,
                                                                    step_id: step_id.clone() });
                self.steps[index].started_at = Some(Utc::now());
                self.steps[index].attempts += 1;

                match contract.commit(&mut self.ctx).await {
                    Ok(hash) => {
                        self.steps[index].status = StepStatus::Submitted;
                        self.steps[index].tx_hash = Some(hash);
                        self.store.append_kind(self.ctx.flow_id,
                                               FlowEventKind::StepSubmitted { step_index: index,
                                                                              step_id: step_id.clone(),
                                                                              tx_hash: hash });
                        hash
                    }
                    Err(error) => return self.fail_step(index, error),
                }
            }
        };

        self.steps[index].status = StepStatus::Confirming;
        self.store.append_kind(self.ctx.flow_id,
                               FlowEventKind::StepConfirming { step_index: index,
                                                               step_id: step_id.clone(),
                                                               tx_hash });

        match contract.verify(&mut self.ctx, tx_hash).await {
            Ok(()) => {
                self.steps[index].status = StepStatus::Succeeded;
                self.steps[index].finished_at = Some(Utc::now());
                self.store.append_kind(self.ctx.flow_id,
                                       FlowEventKind::StepSucceeded { step_index: index,
                                                                      step_id,
                                                                      tx_hash });
                Ok(())
            }
            Err(FlowError::VerificationStalled) => {
                // El efecto on-chain existe: el paso queda en Confirming y
                // el flujo señala "reintentar más tarde", nunca Failed.
                self.store.append_kind(self.ctx.flow_id,
                                       FlowEventKind::StepStalled { step_index: index,
                                                                    step_id,
                                                                    tx_hash });
                self.status = FlowStatus::StepNeedsRetry;
                Err(FlowError::VerificationStalled)
            }
            Err(error) => self.fail_step(index, error),
        }
    }

    fn fail_step(&mut self, index: usize, error: FlowError) -> Result<(), FlowError> {
        self.steps[index].status = StepStatus::Failed;
        self.steps[index].error = Some(error.clone());
        self.steps[index].finished_at = Some(Utc::now());
        self.store.append_kind(self.ctx.flow_id,
                               FlowEventKind::StepFailed { step_index: index,
                                                           step_id: self.steps[index].id.clone(),
                                                           error: error.clone() });
        self.status = FlowStatus::Failed;
        Err(error)
    }

    fn complete_flow(&mut self) {
        let tx_hashes: Vec<String> = self.steps
                                         .iter()
                                         .filter_map(|s| s.tx_hash.map(|h| h.to_string()))
                                         .collect();
        let flow_fp = hash_value(&serde_json::json!({
            "engine_version": crate::constants::ENGINE_VERSION,
            "flow": self.declaration.name(),
            "tx_hashes": tx_hashes,
        }));
        self.store.append_kind(self.ctx.flow_id, FlowEventKind::FlowCompleted { flow_fingerprint: flow_fp });
        self.status = FlowStatus::Succeeded;
    }
}
