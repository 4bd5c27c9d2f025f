//! Console and structured reports.

use base::{error::BrdfitError, Band};
use bxdf::{
    fitting::{FitFailure, FitResult, FittedParams, FittingReport},
    model::BrdfModel,
};
use serde::Serialize;
use std::{io::Write, path::Path};

/// Structured output formats.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per (file, band, model).
    #[clap(name = "csv")]
    Csv,
    /// An array of objects.
    #[clap(name = "json")]
    Json,
}

/// One (file, band, model) outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Input file.
    pub file: String,
    /// Fitted band.
    pub band: Band,
    /// Fitted model.
    pub model: BrdfModel,
    /// `ok` or `failed`.
    pub status: &'static str,
    /// Coefficient of determination.
    pub r2: Option<f64>,
    /// Mean of predicted − observed.
    pub bias: Option<f64>,
    /// Root mean squared error.
    pub rmse: Option<f64>,
    /// Parameter names in model order.
    pub param_names: Vec<&'static str>,
    /// Fitted parameters in model order.
    pub params: Vec<f64>,
    /// Failure reason.
    pub error: Option<String>,
}

/// Flat form of [`ReportRow`] for CSV.
#[derive(Serialize)]
struct CsvRow<'a> {
    file: &'a str,
    band: Band,
    model: BrdfModel,
    status: &'static str,
    r2: Option<f64>,
    bias: Option<f64>,
    rmse: Option<f64>,
    params: String,
    error: Option<&'a str>,
}

impl ReportRow {
    fn from_result(file: &Path, result: &FitResult) -> Self {
        Self {
            file: file.display().to_string(),
            band: result.band,
            model: result.model,
            status: "ok",
            r2: Some(result.stats.r2),
            bias: Some(result.stats.bias),
            rmse: Some(result.stats.rmse),
            param_names: result.model.param_names().to_vec(),
            params: result.params.values(),
            error: None,
        }
    }

    fn from_failure(file: &Path, failure: &FitFailure) -> Self {
        Self {
            file: file.display().to_string(),
            band: failure.band,
            model: failure.model,
            status: "failed",
            r2: None,
            bias: None,
            rmse: None,
            param_names: failure.model.param_names().to_vec(),
            params: Vec::new(),
            error: Some(failure.error.to_string()),
        }
    }

    fn to_csv(&self) -> CsvRow<'_> {
        CsvRow {
            file: &self.file,
            band: self.band,
            model: self.model,
            status: self.status,
            r2: self.r2,
            bias: self.bias,
            rmse: self.rmse,
            params: self
                .param_names
                .iter()
                .zip(&self.params)
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" "),
            error: self.error.as_deref(),
        }
    }
}

/// Flattens a fitting report into rows ordered by band then model.
pub fn report_rows(file: &Path, report: &FittingReport) -> Vec<ReportRow> {
    report
        .iter()
        .map(|outcome| match outcome {
            Ok(result) => ReportRow::from_result(file, result),
            Err(failure) => ReportRow::from_failure(file, failure),
        })
        .collect()
}

fn format_values(values: &[f64]) -> String {
    let values = values.iter().map(|v| format!("{v:.6}")).collect::<Vec<_>>();
    format!("[{}]", values.join(", "))
}

/// Prints the report of one file.
pub fn write_console_report<W: Write>(
    out: &mut W,
    file: &Path,
    report: &FittingReport,
) -> std::io::Result<()> {
    for outcome in report.iter() {
        match outcome {
            Ok(result) => {
                writeln!(
                    out,
                    "File: {}, Band: {}, Model: {}",
                    file.display(),
                    result.band,
                    result.model
                )?;
                writeln!(
                    out,
                    "R²: {:.4}, BIAS: {:.4}, RMSE: {:.4}",
                    result.stats.r2, result.stats.bias, result.stats.rmse
                )?;
                match &result.params {
                    FittedParams::Nonlinear(fit) => {
                        writeln!(out, "Fitted Parameters: {}", format_values(&fit.params))?
                    },
                    FittedParams::Linear(fit) => writeln!(
                        out,
                        "Coefficients: {}, Intercept: {:.6}",
                        format_values(&fit.coefficients),
                        fit.intercept
                    )?,
                }
            },
            Err(failure) => writeln!(
                out,
                "Model {} fitting failed for {} in {}: {}",
                failure.model,
                failure.band,
                file.display(),
                failure.error
            )?,
        }
    }
    Ok(())
}

/// Writes the rows to `path` in the given format.
pub fn write_rows(path: &Path, format: OutputFormat, rows: &[ReportRow]) -> Result<(), BrdfitError> {
    let file = std::fs::File::create(path).map_err(|err| {
        BrdfitError::from_io_error(err, format!("Failed to create {}", path.display()))
    })?;
    let write_err = |err: Box<dyn std::error::Error + Send + Sync>| {
        BrdfitError::new(format!("Failed to write {}", path.display()), Some(err))
    };
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(file);
            for row in rows {
                writer
                    .serialize(row.to_csv())
                    .map_err(|err| write_err(Box::new(err)))?;
            }
            writer.flush().map_err(|err| write_err(Box::new(err)))?;
        },
        OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), rows)
                .map_err(|err| write_err(Box::new(err)))?;
        },
    }
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::error::FitError;
    use bxdf::fitting::{GoodnessOfFit, LinearFit};

    fn sample_report() -> FittingReport {
        let mut report = FittingReport::default();
        report.insert(
            Band::Red,
            BrdfModel::Rtlsr,
            Ok(FitResult {
                band: Band::Red,
                model: BrdfModel::Rtlsr,
                stats: GoodnessOfFit {
                    r2: 0.9,
                    bias: 0.0,
                    rmse: 0.01,
                },
                params: FittedParams::Linear(LinearFit {
                    intercept: 0.05,
                    coefficients: [0.02, 0.01],
                }),
                fitted: vec![0.05; 3].into(),
            }),
        );
        report.insert(
            Band::Nir,
            BrdfModel::OriginalRpv,
            Err(FitError::Convergence {
                reason: String::from("LostPatience"),
            }),
        );
        report
    }

    #[test]
    fn console_layout() {
        let mut out = Vec::new();
        write_console_report(&mut out, Path::new("sample.csv"), &sample_report()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, [
            "File: sample.csv, Band: RED, Model: RTLSR",
            "R²: 0.9000, BIAS: 0.0000, RMSE: 0.0100",
            "Coefficients: [0.020000, 0.010000], Intercept: 0.050000",
            "Model Original_RPV fitting failed for NIR in sample.csv: solver did not converge: \
             LostPatience",
        ]);
    }

    #[test]
    fn rows_follow_report_order() {
        let rows = report_rows(Path::new("sample.csv"), &sample_report());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, "ok");
        assert_eq!(rows[0].params, vec![0.05, 0.02, 0.01]);
        assert_eq!(rows[0].param_names, vec!["f_iso", "f_vol", "f_geo"]);
        assert_eq!(rows[1].status, "failed");
        assert_eq!(rows[1].r2, None);
        assert_eq!(rows[0].to_csv().params, "f_iso=0.05 f_vol=0.02 f_geo=0.01");
    }

    #[test]
    fn json_rows_use_report_names() {
        let rows = report_rows(Path::new("sample.csv"), &sample_report());
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["band"], "RED");
        assert_eq!(json[0]["model"], "RTLSR");
        assert_eq!(json[1]["model"], "Original_RPV");
        assert_eq!(json[1]["error"], "solver did not converge: LostPatience");
    }

    #[test]
    fn csv_output() {
        let rows = report_rows(Path::new("sample.csv"), &sample_report());
        let path = std::env::temp_dir().join(format!("brdfit-report-{}.csv", std::process::id()));
        write_rows(&path, OutputFormat::Csv, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("file,band,model,status,r2,bias,rmse,params,error")
        );
        assert_eq!(
            lines.next(),
            Some("sample.csv,RED,RTLSR,ok,0.9,0.0,0.01,f_iso=0.05 f_vol=0.02 f_geo=0.01,")
        );
        assert_eq!(lines.count(), 1);
    }
}
