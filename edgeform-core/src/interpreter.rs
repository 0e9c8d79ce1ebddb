//! Interpreter - Execute Effects using a Provider
//!
//! The Interpreter executes Effects contained in a Plan in order,
//! collecting the results. This is where side effects actually occur.

use std::sync::Arc;

use log::{debug, info};

use crate::data::ResourceData;
use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{ErrorKind, Provider, ProviderError, ProviderResult, ResourceType};
use crate::resource::{Resource, ResourceId, State};

/// Result of executing each Effect
#[derive(Debug)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Update succeeded
    Updated { state: State },
    /// Delete succeeded
    Deleted { id: ResourceId },
    /// Skipped (e.g., dry-run)
    Skipped { reason: String },
}

/// Result of executing the entire Plan
#[derive(Debug)]
pub struct ApplyResult {
    pub outcomes: Vec<Result<EffectOutcome, ProviderError>>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// If true, skip actual side effects
    pub dry_run: bool,
    /// Continue on error
    pub continue_on_error: bool,
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Execute a Plan, interpreting all Effects and causing side effects
    pub async fn apply(&self, plan: &Plan) -> ApplyResult {
        let mut outcomes = Vec::new();
        let mut success_count = 0;
        let mut failure_count = 0;

        for effect in plan.effects() {
            let result = self
                .execute_effect(effect)
                .await
                .map_err(|e| e.for_resource(effect.resource_id().clone()));

            match &result {
                Ok(_) => success_count += 1,
                Err(_) => {
                    failure_count += 1;
                    if !self.config.continue_on_error {
                        outcomes.push(result);
                        break;
                    }
                }
            }

            outcomes.push(result);
        }

        ApplyResult {
            outcomes,
            success_count,
            failure_count,
        }
    }

    /// Adopt an existing remote entity under a declared block name
    pub async fn import(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        info!("importing {} from {}", id, identifier);
        let resource_type = self.resource_type(id)?;
        let mut data = ResourceData::new(Arc::new(resource_type.schema())).with_id(identifier);
        resource_type
            .import(&mut data)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
        Ok(state_of(id, data))
    }

    /// Re-read a recorded resource from the platform
    pub async fn refresh(&self, state: &State) -> ProviderResult<State> {
        let resource_type = self.resource_type(&state.id)?;
        let mut data = self.recorded_data(resource_type.as_ref(), state)?;
        resource_type
            .read(&mut data)
            .await
            .map_err(|e| e.for_resource(state.id.clone()))?;
        Ok(state_of(&state.id, data))
    }

    fn resource_type(&self, id: &ResourceId) -> ProviderResult<Arc<dyn ResourceType>> {
        self.provider
            .resource_type(&id.resource_type)
            .ok_or_else(|| ProviderError::unknown_type(&id.resource_type).for_resource(id.clone()))
    }

    fn recorded_data(
        &self,
        resource_type: &dyn ResourceType,
        state: &State,
    ) -> ProviderResult<ResourceData> {
        let identifier = state.identifier.as_deref().ok_or_else(|| {
            ProviderError::new(
                ErrorKind::InvalidId,
                "recorded state has no identifier".to_string(),
            )
        })?;
        Ok(ResourceData::new(Arc::new(resource_type.schema()))
            .with_id(identifier)
            .with_attributes(state.attributes.clone()))
    }

    /// Execute a single Effect
    async fn execute_effect(&self, effect: &Effect) -> ProviderResult<EffectOutcome> {
        if self.config.dry_run {
            return Ok(EffectOutcome::Skipped {
                reason: "dry-run mode".to_string(),
            });
        }
        debug!("executing {} {}", effect.kind(), effect.resource_id());

        match effect {
            Effect::Read(resource) => {
                let data_source = self
                    .provider
                    .data_source_type(&resource.id.resource_type)
                    .ok_or_else(|| ProviderError::unknown_type(&resource.id.resource_type))?;
                let mut data = declared_data(data_source.schema(), resource);
                data.validate()?;
                data_source.read(&mut data).await?;
                Ok(EffectOutcome::Read {
                    state: state_of(&resource.id, data),
                })
            }
            Effect::Create(resource) => {
                let resource_type = self.resource_type(&resource.id)?;
                let mut data = declared_data(resource_type.schema(), resource);
                resource_type.create(&mut data).await?;
                Ok(EffectOutcome::Created {
                    state: state_of(&resource.id, data),
                })
            }
            Effect::Update { id, from, to } => {
                let resource_type = self.resource_type(id)?;
                let identifier = from.identifier.as_deref().ok_or_else(|| {
                    ProviderError::new(ErrorKind::InvalidId, "recorded state has no identifier")
                })?;
                let mut data = declared_data(resource_type.schema(), to).with_id(identifier);
                resource_type.update(&mut data).await?;
                Ok(EffectOutcome::Updated {
                    state: state_of(id, data),
                })
            }
            Effect::Delete(state) => {
                let resource_type = self.resource_type(&state.id)?;
                let mut data = self.recorded_data(resource_type.as_ref(), state)?;
                resource_type.delete(&mut data).await?;
                Ok(EffectOutcome::Deleted {
                    id: state.id.clone(),
                })
            }
        }
    }
}

fn declared_data(schema: crate::schema::ResourceSchema, resource: &Resource) -> ResourceData {
    ResourceData::new(Arc::new(schema)).with_attributes(resource.attributes.clone())
}

fn state_of(id: &ResourceId, data: ResourceData) -> State {
    let identifier = data.id().map(str::to_string);
    let mut state = State::existing(id.clone(), data.into_attributes());
    state.identifier = identifier;
    state
}
