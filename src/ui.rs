//! Saída de terminal do stagetime com cores.
//!
//! Usa a crate `console` para estilização. O [`Report`] imprime horas úteis,
//! prazos e o status de SLA, ou JSON quando `--json` é pedido.

use console::Style;
use serde::Serialize;

use stagetime::{Instant, SlaState, SlaStatus, StageTimeReport};

/// Impressora dos resultados de cada subcomando.
pub struct Report {
    json: bool,
    // Estilo verde para itens em dia.
    green: Style,
    // Estilo amarelo para itens atrasados no estágio.
    yellow: Style,
    // Estilo vermelho para itens vencidos.
    red: Style,
    // Estilo esmaecido para itens suspensos e valores ausentes.
    dim: Style,
}

impl Report {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            green: Style::new().green().bold(),
            yellow: Style::new().yellow().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
        }
    }

    pub fn hours(&self, hours: f64) {
        if self.json {
            self.print_json(&serde_json::json!({ "businessHours": hours }));
        } else {
            println!("{hours:.2}");
        }
    }

    pub fn deadline(&self, at: Instant) {
        if self.json {
            self.print_json(&serde_json::json!({ "deadline": at.to_rfc3339() }));
        } else {
            println!("{}", at.to_rfc3339());
        }
    }

    pub fn stage_time(&self, report: &StageTimeReport) {
        if self.json {
            self.print_json(report);
            return;
        }
        println!("Stage:       {}", report.stage);
        println!("In stage:    {}", if report.in_stage { "yes" } else { "no" });
        println!("Visits:      {}", report.visits);
        println!("Instance:    {}", self.format_hours(report.instance_hours));
        println!("Cumulative:  {}", self.format_hours(report.cumulative_hours));
    }

    pub fn status(&self, stage: &str, status: &SlaStatus) {
        if self.json {
            self.print_json(status);
            return;
        }
        let style = match status.state {
            SlaState::OnTrack => &self.green,
            SlaState::BehindSchedule => &self.yellow,
            SlaState::Overdue => &self.red,
            SlaState::Suspended => &self.dim,
        };
        println!("{} {stage}", style.apply_to(status.state));
        println!("  Instance:    {}", self.format_hours(status.instance_hours));
        println!("  Cumulative:  {}", self.format_hours(status.cumulative_hours));
        println!("  Remaining:   {}", self.format_hours(status.remaining_hours));
        if status.total_remaining_hours.is_some() {
            let total = self.format_hours(status.total_remaining_hours);
            if status.total_budget_exceeded {
                println!("  Total left:  {} {}", total, self.yellow.apply_to("(exceeded)"));
            } else {
                println!("  Total left:  {total}");
            }
        }
    }

    fn format_hours(&self, hours: Option<f64>) -> String {
        match hours {
            Some(h) => format!("{h:.2}h"),
            None => self.dim.apply_to("unavailable").to_string(),
        }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}
