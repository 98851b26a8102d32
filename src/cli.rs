//! Interface de linha de comando do stagetime baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (hours, deadline,
//! stage-time, status) e flags globais (--config, --now, --json, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// stagetime — tempo de estágio em horas úteis e classificação de SLA.
#[derive(Debug, Parser)]
#[command(name = "stagetime", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./stagetime.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Instante usado como "agora" (RFC 3339 ou YYYY-MM-DD HH:MM:SS).
    #[arg(long, global = true)]
    pub now: Option<String>,

    /// Emite o resultado em JSON.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Business hours elapsed between two instants.
    Hours {
        start: String,
        end: String,
    },

    /// Instant reached after adding business hours to a start instant.
    Deadline {
        start: String,
        #[arg(allow_negative_numbers = true)]
        hours: f64,
    },

    /// Instance and cumulative time an item has spent in a stage.
    StageTime {
        /// JSON file with the item record and its chronology.
        item: PathBuf,

        /// Stage to measure (defaults to the item's current stage).
        #[arg(long)]
        stage: Option<String>,
    },

    /// SLA status of an item against the configured stage thresholds.
    Status {
        /// JSON file with the item record and its chronology.
        item: PathBuf,
    },
}
