use anyhow::Result;

use crate::allocation::AllocationResult;
use crate::phases::PhaseReport;
use crate::scoring::SiteScore;

pub fn rank_to_csv(scores: &[SiteScore], threshold: f64) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "site_id",
        "name",
        "cost_score",
        "capacity_score",
        "risk_score",
        "ej_score",
        "composite",
        "eligible",
    ])?;
    for score in scores {
        writer.write_record([
            score.site_id.clone(),
            score.name.clone(),
            format!("{:.4}", score.breakdown.cost),
            format!("{:.4}", score.breakdown.capacity),
            format!("{:.4}", score.breakdown.risk),
            format!("{:.4}", score.breakdown.ej),
            format!("{:.4}", score.composite),
            (score.composite >= threshold).to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn allocation_to_csv(result: &AllocationResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "site_id",
        "assigned_tpd",
        "design_capacity_tpd",
        "feasibility",
        "eligible",
    ])?;
    for status in &result.per_site {
        writer.write_record([
            status.site_id.clone(),
            status.assigned_tpd.to_string(),
            status.design_capacity_tpd.to_string(),
            format!("{:.4}", status.feasibility),
            status.eligible.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn phases_to_csv(reports: &[PhaseReport]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "phase",
        "duration_years",
        "site_id",
        "assigned_tpd",
        "capacity_tons",
        "revenue_usd",
        "revenue_per_year_usd",
    ])?;
    for report in reports {
        for site in &report.sites {
            writer.write_record([
                report.index.to_string(),
                report.duration_years.to_string(),
                site.site_id.clone(),
                site.assigned_tpd.to_string(),
                format!("{:.0}", site.capacity_tons),
                format!("{:.2}", site.revenue_usd),
                format!("{:.2}", site.revenue_per_year_usd),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
