//! Configuração do motor carregada a partir de `stagetime.toml`.
//!
//! A struct [`StagetimeConfig`] contém o fuso de referência e os limites de
//! tempo por estágio (globais ou por tipo de workflow). Valores não presentes
//! no arquivo usam defaults sensíveis. A variável de ambiente
//! `STAGETIME_UTC_OFFSET_MINUTES` tem precedência sobre o arquivo.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::calendar::BusinessCalendar;
use crate::error::StagetimeError;
use crate::sla::StageThresholds;

pub const CONFIG_FILE: &str = "stagetime.toml";
pub const OFFSET_ENV: &str = "STAGETIME_UTC_OFFSET_MINUTES";

/// Configuração de nível superior carregada de `stagetime.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StagetimeConfig {
    /// Deslocamento do fuso de referência em minutos a leste de UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Limites por estágio aplicados a qualquer workflow.
    #[serde(default)]
    pub stages: BTreeMap<String, StageThresholds>,

    /// Limites por estágio específicos de um tipo de workflow.
    #[serde(default)]
    pub workflows: BTreeMap<String, BTreeMap<String, StageThresholds>>,
}

impl StagetimeConfig {
    /// Carrega a configuração de `stagetime.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, StagetimeError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito, com os mesmos defaults.
    pub fn load_from(path: &Path) -> Result<Self, StagetimeError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<StagetimeConfig>(&contents)?
        } else {
            Self::default()
        };

        config.apply_offset_override(std::env::var(OFFSET_ENV).ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Aplica o valor de `STAGETIME_UTC_OFFSET_MINUTES`, que tem precedência
    /// sobre o arquivo. Valor ausente ou em branco é ignorado.
    pub fn apply_offset_override(&mut self, raw: Option<&str>) -> Result<(), StagetimeError> {
        if let Some(raw) = raw
            && !raw.trim().is_empty()
        {
            self.utc_offset_minutes = raw.trim().parse().map_err(|_| {
                StagetimeError::Config(format!("{OFFSET_ENV} must be an integer, got `{raw}`"))
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), StagetimeError> {
        self.calendar()?;

        let globals = self.stages.iter().map(|(stage, t)| (None, stage, t));
        let scoped = self.workflows.iter().flat_map(|(workflow, stages)| {
            stages.iter().map(move |(stage, t)| (Some(workflow.as_str()), stage, t))
        });
        for (workflow, stage, thresholds) in globals.chain(scoped) {
            let limits = [thresholds.max_instance_time, thresholds.max_total_time];
            if limits.iter().flatten().any(|h| !h.is_finite() || *h <= 0.0) {
                // Limites não positivos valem como "sem limite".
                warn!(workflow, stage = %stage, "non-positive stage threshold treated as unlimited");
            }
        }
        Ok(())
    }

    pub fn calendar(&self) -> Result<BusinessCalendar, StagetimeError> {
        Ok(BusinessCalendar::from_offset_minutes(self.utc_offset_minutes)?)
    }

    /// Limites do estágio, preferindo os do workflow quando existirem.
    pub fn thresholds_for(&self, workflow: Option<&str>, stage: &str) -> StageThresholds {
        workflow
            .and_then(|w| self.workflows.get(w))
            .and_then(|stages| stages.get(stage))
            .or_else(|| self.stages.get(stage))
            .copied()
            .unwrap_or_default()
    }
}
