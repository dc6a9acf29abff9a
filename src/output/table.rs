use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::allocation::AllocationResult;
use crate::hazard::ej::EjScore;
use crate::hazard::HazardReport;
use crate::phases::PhaseReport;
use crate::scoring::cost::CostScore;
use crate::scoring::SiteScore;

pub fn render_rank_table(scores: &[SiteScore], threshold: f64) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Site",
        "Cost",
        "Capacity",
        "Risk",
        "EJ",
        "Composite",
        "Eligible",
    ]);

    for score in scores {
        let eligible = score.composite >= threshold;
        let elig_cell = if eligible {
            Cell::new("YES").fg(Color::Green)
        } else {
            Cell::new("NO").fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(&score.name),
            Cell::new(format!("{:.3}", score.breakdown.cost)),
            Cell::new(format!("{:.3}", score.breakdown.capacity)),
            Cell::new(format!("{:.3}", score.breakdown.risk)),
            Cell::new(format!("{:.3}", score.breakdown.ej)),
            Cell::new(format!("{:.3}", score.composite)),
            elig_cell,
        ]));
    }
    table.to_string()
}

pub fn render_allocation_table(result: &AllocationResult) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Site",
        "Assigned (t/d)",
        "Capacity (t/d)",
        "Feasibility",
        "Eligible",
    ]);
    for status in &result.per_site {
        let elig_cell = if status.eligible {
            Cell::new("YES").fg(Color::Green)
        } else {
            Cell::new("NO").fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(&status.name),
            Cell::new(status.assigned_tpd.to_string()),
            Cell::new(status.design_capacity_tpd.to_string()),
            Cell::new(format!("{:.3}", status.feasibility)),
            elig_cell,
        ]));
    }

    let verdict = if result.satisfies_constraint {
        format!("Total {} t/d satisfies {}", result.total_tpd, result.policy)
    } else {
        format!(
            "Total {} t/d does NOT satisfy {}",
            result.total_tpd, result.policy
        )
    };
    let mut out = table.to_string();
    out.push('\n');
    out.push_str(&verdict);
    out
}

pub fn render_phase_tables(reports: &[PhaseReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            "Site",
            "Assigned (t/d)",
            "Capacity (t)",
            "Revenue ($)",
            "Revenue/yr ($)",
        ]);
        for site in &report.sites {
            table.add_row(vec![
                site.name.clone(),
                site.assigned_tpd.to_string(),
                format!("{:.0}", site.capacity_tons),
                format!("{:.2}", site.revenue_usd),
                format!("{:.2}", site.revenue_per_year_usd),
            ]);
        }
        out.push_str(&format!(
            "Phase {} ({} yrs)\n{}\nTotals: {:.0} t, ${:.2}, ${:.2}/yr\n\n",
            report.index,
            report.duration_years,
            table,
            report.total_capacity_tons,
            report.total_revenue_usd,
            report.total_revenue_per_year_usd,
        ));
    }
    out.trim_end().to_string()
}

pub fn render_hazard_table(report: &HazardReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Layer", "Fraction"]);
    for fraction in &report.fractions {
        table.add_row(vec![
            fraction.layer.clone(),
            format!("{:.2}%", fraction.fraction * 100.0),
        ]);
    }
    let mut out = table.to_string();
    out.push_str(&format!(
        "\nComposite hydro risk = {:.2}%",
        report.composite_risk * 100.0
    ));
    out
}

pub fn render_ej_table(scores: &[EjScore]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Site", "Air", "Diesel", "Prox", "Demo", "EJ Index"]);
    for score in scores {
        table.add_row(vec![
            score.site_id.clone(),
            format!("{:.3}", score.air),
            format!("{:.3}", score.diesel),
            format!("{:.3}", score.prox),
            format!("{:.3}", score.demo),
            format!("{:.3}", score.index),
        ]);
    }
    table.to_string()
}

pub fn render_cost_table(scores: &[CostScore]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Site", "Cost Index"]);
    for score in scores {
        table.add_row(vec![score.name.clone(), format!("{:.3}", score.index)]);
    }
    table.to_string()
}
