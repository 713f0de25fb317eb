//! Spreadsheet layout of a [`Report`].
//!
//! Sheets, in order: `Dados`, `Interpolados`, `Interseções`,
//! `Curva do Sistema` (only with at least one system curve) and `Gráficos`.
//! Rows and columns are zero-based here; the charts reference the
//! `Interpolados` and `Curva do Sistema` tables by cell range.

use rust_xlsxwriter::{
    Chart, ChartFormat, ChartLine, ChartLineDashType, ChartType, Color, ColNum, Format,
    FormatAlign, RowNum, Workbook, Worksheet, XlsxError,
};

use crate::models::pump::{OperatingPoint, SystemCurve};

use super::{PowerRow, Report};

const DATA_SHEET: &str = "Dados";
const CURVES_SHEET: &str = "Interpolados";
const INTERSECTIONS_SHEET: &str = "Interseções";
const SYSTEM_SHEET: &str = "Curva do Sistema";
const CHARTS_SHEET: &str = "Gráficos";

const FLOW_HEADER: &str = "Vazão (m³/h)";
const HEAD_HEADER: &str = "Altura (m)";
const POWER_HEADERS: [&str; 5] = [
    FLOW_HEADER,
    HEAD_HEADER,
    "Eficiência (%)",
    "Potência Hidráulica (W)",
    "Potência Mecânica (W)",
];

const EFFICIENCY_COLORS: [u32; 8] = [
    0xFF0000, 0x00AA00, 0x0000FF, 0xFF9900, 0x9900FF, 0xFF00FF, 0x00FFFF, 0xAAAA00,
];
const SYSTEM_COLORS: [u32; 2] = [0x00AA00, 0xFF9900];

const SYSTEM_LINE_WIDTH: f64 = 2.25;
const EFFICIENCY_LINE_WIDTH: f64 = 1.5;

const FLOW_COL: ColNum = 0;
const HEAD_COL: ColNum = 1;
const EFFICIENCY_COL: ColNum = 2;

/// Where the system-curve tables start.
const SYSTEM_HEADER_ROW: RowNum = 3;

/// Renders a report into the bytes of an `.xlsx` file.
///
/// # Errors
///
/// Returns an [`XlsxError`] if the workbook cannot be built.
pub fn render_workbook(report: &Report) -> Result<Vec<u8>, XlsxError> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    workbook.push_worksheet(data_sheet(report, &formats)?);

    let (curves, series) = curves_sheet(report, &formats)?;
    workbook.push_worksheet(curves);

    workbook.push_worksheet(intersections_sheet(report, &formats)?);

    let mut system_series = Vec::new();
    if !report.system_curves.is_empty() {
        let (sheet, ranges) = system_sheet(&report.system_curves, &formats)?;
        workbook.push_worksheet(sheet);
        system_series = ranges;
    }

    workbook.push_worksheet(charts_sheet(report, &series, &system_series, &formats)?);

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(bytes = bytes.len(), "rendered workbook");
    Ok(bytes)
}

struct Formats {
    header: Format,
    title: Format,
    italic: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold().set_align(FormatAlign::Center),
            title: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            italic: Format::new().set_italic(),
        }
    }
}

/// A worksheet that tracks the widest value in each column.
struct Sheet {
    worksheet: Worksheet,
    widths: Vec<usize>,
}

impl Sheet {
    fn new(name: &str) -> Result<Self, XlsxError> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(name)?;
        Ok(Self {
            worksheet,
            widths: Vec::new(),
        })
    }

    fn fit(&mut self, col: ColNum, len: usize) {
        let col = usize::from(col);
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        self.widths[col] = self.widths[col].max(len);
    }

    fn text(&mut self, row: RowNum, col: ColNum, text: &str) -> Result<(), XlsxError> {
        self.worksheet.write_string(row, col, text)?;
        self.fit(col, text.chars().count());
        Ok(())
    }

    fn styled(
        &mut self,
        row: RowNum,
        col: ColNum,
        text: &str,
        format: &Format,
    ) -> Result<(), XlsxError> {
        self.worksheet
            .write_string_with_format(row, col, text, format)?;
        self.fit(col, text.chars().count());
        Ok(())
    }

    /// Writes a number; infinities and `NaN` have no cell value and are written as text.
    fn number(&mut self, row: RowNum, col: ColNum, value: f64) -> Result<(), XlsxError> {
        if !value.is_finite() {
            return self.text(row, col, &value.to_string());
        }
        self.worksheet.write_number(row, col, value)?;
        self.fit(col, format!("{value:.2}").len());
        Ok(())
    }

    fn title(
        &mut self,
        row: RowNum,
        last_col: ColNum,
        text: &str,
        format: &Format,
    ) -> Result<(), XlsxError> {
        self.worksheet
            .merge_range(row, 0, row, last_col, text, format)?;
        Ok(())
    }

    fn headers(
        &mut self,
        row: RowNum,
        first_col: ColNum,
        headers: &[&str],
        format: &Format,
    ) -> Result<(), XlsxError> {
        for (col, header) in (first_col..).zip(headers) {
            self.styled(row, col, header, format)?;
        }
        Ok(())
    }

    fn power_row(&mut self, row: RowNum, first_col: ColNum, values: &PowerRow) -> Result<(), XlsxError> {
        let cells = [
            values.flow,
            values.head,
            values.efficiency,
            values.hydraulic_power,
            values.mechanical_power,
        ];
        for (col, value) in (first_col..).zip(cells) {
            self.number(row, col, value)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Worksheet, XlsxError> {
        for (col, &len) in (0..).zip(&self.widths) {
            if len > 0 {
                self.worksheet
                    .set_column_width(col, (len + 2) as f64 * 1.2)?;
            }
        }
        Ok(self.worksheet)
    }
}

fn data_sheet(report: &Report, formats: &Formats) -> Result<Worksheet, XlsxError> {
    let mut sheet = Sheet::new(DATA_SHEET)?;
    let mut row = 0;

    for table in &report.raw {
        let combined = !table.breakdown.is_empty();
        let last_col = if combined { 5 } else { 4 };

        sheet.title(row, last_col, &format!("Rotor {}", table.rotor), &formats.title)?;
        row += 1;
        sheet.headers(row, 0, &POWER_HEADERS, &formats.header)?;
        if combined {
            sheet.styled(row, 5, "Eficiência por Rotor", &formats.header)?;
        }
        row += 1;

        for (i, values) in table.rows.iter().enumerate() {
            sheet.power_row(row, 0, values)?;
            if let Some(text) = table.breakdown.get(i) {
                sheet.text(row, 5, text)?;
            }
            row += 1;
        }

        if let Some(best) = &table.best_efficiency {
            row += 1;
            sheet.styled(row, 0, "Ponto de Máxima Eficiência", &formats.header)?;
            row += 1;
            sheet.power_row(row, 0, best)?;
            row += 1;
        }

        row += 2;
    }

    sheet.finish()
}

/// Cell ranges of one resampled rotor curve.
struct CurveSeries<'a> {
    rotor: &'a str,
    parallel: bool,
    first_row: RowNum,
    last_row: RowNum,
}

fn curves_sheet<'a>(
    report: &'a Report,
    formats: &Formats,
) -> Result<(Worksheet, Vec<CurveSeries<'a>>), XlsxError> {
    let mut sheet = Sheet::new(CURVES_SHEET)?;
    let mut series = Vec::with_capacity(report.interpolated.len());
    let mut row = 0;

    for table in &report.interpolated {
        sheet.title(row, 4, &format!("Rotor {}", table.rotor), &formats.title)?;
        row += 1;
        sheet.headers(row, 0, &POWER_HEADERS, &formats.header)?;
        row += 1;

        let first_row = row;
        for values in &table.rows {
            sheet.power_row(row, 0, values)?;
            row += 1;
        }
        if row > first_row {
            series.push(CurveSeries {
                rotor: &table.rotor,
                parallel: table.parallel,
                first_row,
                last_row: row - 1,
            });
        }

        row += 2;
    }

    Ok((sheet.finish()?, series))
}

fn intersections_sheet(report: &Report, formats: &Formats) -> Result<Worksheet, XlsxError> {
    let mut sheet = Sheet::new(INTERSECTIONS_SHEET)?;

    if report.intersections.is_empty() {
        sheet.title(0, 5, "Interseções das Curvas", &formats.title)?;
        return sheet.finish();
    }

    let mut headers = vec!["Rotor"];
    headers.extend(POWER_HEADERS);

    let mut row = 0;
    for block in &report.intersections {
        let title = format!(
            "Pontos de Interseção - Curva do Sistema {}",
            block.system_curve
        );
        sheet.title(row, 5, &title, &formats.title)?;
        row += 1;
        sheet.headers(row, 0, &headers, &formats.header)?;
        row += 1;

        for point in &block.points {
            write_operating_point(&mut sheet, row, point)?;
            row += 1;
        }

        row += 2;
    }

    sheet.finish()
}

fn write_operating_point(
    sheet: &mut Sheet,
    row: RowNum,
    point: &OperatingPoint,
) -> Result<(), XlsxError> {
    sheet.text(row, 0, &format!("Rotor {}", point.rotor))?;
    let values = PowerRow {
        flow: point.flow,
        head: point.head,
        efficiency: point.efficiency,
        hydraulic_power: point.hydraulic_watts(),
        mechanical_power: point.mechanical_watts(),
    };
    sheet.power_row(row, 1, &values)
}

/// Cell ranges of one system curve.
struct SystemSeries {
    number: usize,
    flow_col: ColNum,
    first_row: RowNum,
    last_row: RowNum,
}

fn system_sheet(
    curves: &[SystemCurve],
    formats: &Formats,
) -> Result<(Worksheet, Vec<SystemSeries>), XlsxError> {
    let mut sheet = Sheet::new(SYSTEM_SHEET)?;
    sheet.title(0, 3, "Curvas do Sistema (Geradas Automaticamente)", &formats.title)?;

    let mut series = Vec::with_capacity(curves.len());
    for (flow_col, curve) in (0..).step_by(2).zip(curves) {
        let number = curve.id().number();
        sheet.text(1, flow_col, &format!("Equação (Curva {number}):"))?;
        sheet.text(1, flow_col + 1, curve.equation())?;
        sheet.headers(SYSTEM_HEADER_ROW, flow_col, &[FLOW_HEADER, HEAD_HEADER], &formats.header)?;

        let first_row = SYSTEM_HEADER_ROW + 1;
        let mut row = first_row;
        for &(flow, head) in curve.points() {
            sheet.number(row, flow_col, flow)?;
            sheet.number(row, flow_col + 1, head)?;
            row += 1;
        }
        // A single point draws no line.
        if row > first_row + 1 {
            series.push(SystemSeries {
                number,
                flow_col,
                first_row,
                last_row: row - 1,
            });
        }
    }

    Ok((sheet.finish()?, series))
}

fn line_format(color: Option<u32>, width: Option<f64>, dashed: bool) -> ChartFormat {
    let mut line = ChartLine::new();
    if let Some(rgb) = color {
        line.set_color(Color::RGB(rgb));
    }
    if let Some(width) = width {
        line.set_width(width);
    }
    if dashed {
        line.set_dash_type(ChartLineDashType::Dash);
    }
    let mut format = ChartFormat::new();
    format.set_line(&line);
    format
}

fn scatter_chart(title: &str, y_axis: &str) -> Chart {
    let mut chart = Chart::new(ChartType::ScatterStraight);
    chart.title().set_name(title);
    chart.x_axis().set_name(FLOW_HEADER);
    chart.y_axis().set_name(y_axis);
    chart.set_width(605).set_height(378);
    chart
}

fn charts_sheet(
    report: &Report,
    curves: &[CurveSeries<'_>],
    systems: &[SystemSeries],
    formats: &Formats,
) -> Result<Worksheet, XlsxError> {
    let mut sheet = Sheet::new(CHARTS_SHEET)?;

    let mut performance = scatter_chart("Curvas de Desempenho", HEAD_HEADER);
    let mut efficiency = scatter_chart("Curva de Rendimento", "Eficiência (%)");

    for (index, curve) in curves.iter().enumerate() {
        let flows = (CURVES_SHEET, curve.first_row, FLOW_COL, curve.last_row, FLOW_COL);

        performance
            .add_series()
            .set_categories(flows)
            .set_values((CURVES_SHEET, curve.first_row, HEAD_COL, curve.last_row, HEAD_COL))
            .set_name(format!("Rotor {}", curve.rotor).as_str())
            .set_format(&mut line_format(None, None, curve.parallel));

        let color = EFFICIENCY_COLORS[index % EFFICIENCY_COLORS.len()];
        efficiency
            .add_series()
            .set_categories(flows)
            .set_values((
                CURVES_SHEET,
                curve.first_row,
                EFFICIENCY_COL,
                curve.last_row,
                EFFICIENCY_COL,
            ))
            .set_name(format!("Rendimento {}", curve.rotor).as_str())
            .set_format(&mut line_format(
                Some(color),
                Some(EFFICIENCY_LINE_WIDTH),
                curve.parallel,
            ));
    }

    for system in systems {
        let color = SYSTEM_COLORS[(system.number - 1) % SYSTEM_COLORS.len()];
        performance
            .add_series()
            .set_categories((
                SYSTEM_SHEET,
                system.first_row,
                system.flow_col,
                system.last_row,
                system.flow_col,
            ))
            .set_values((
                SYSTEM_SHEET,
                system.first_row,
                system.flow_col + 1,
                system.last_row,
                system.flow_col + 1,
            ))
            .set_name(format!("Curva do Sistema {}", system.number).as_str())
            .set_format(&mut line_format(Some(color), Some(SYSTEM_LINE_WIDTH), false));
    }

    if !curves.is_empty() || !systems.is_empty() {
        sheet.worksheet.insert_chart(1, 1, &performance)?;
    } else {
        tracing::warn!("nothing to plot in the performance chart");
    }
    if !curves.is_empty() {
        sheet.worksheet.insert_chart(19, 1, &efficiency)?;
    }

    let mut row = 39;
    for curve in &report.system_curves {
        let label = format!("Equação da Curva do Sistema {}:", curve.id());
        sheet.text(row, 1, &label)?;
        sheet.styled(row + 1, 1, curve.equation(), &formats.italic)?;
        row += 3;
    }

    sheet.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Cursor, Read};

    use crate::models::pump::{
        SystemCurveConfig, SystemCurveId, SystemCurveSpec, compute_system_curve,
    };
    use crate::report::{CurveTable, IntersectionBlock, RawTable};

    fn row(flow: f64, head: f64, efficiency: f64) -> PowerRow {
        PowerRow {
            flow,
            head,
            efficiency,
            hydraulic_power: flow * head,
            mechanical_power: if efficiency > 0.0 {
                flow * head / efficiency
            } else {
                f64::INFINITY
            },
        }
    }

    fn report() -> Report {
        let rows = vec![row(0.0, 30.0, 0.0), row(10.0, 25.0, 60.0)];
        let system = compute_system_curve(
            SystemCurveId::First,
            &SystemCurveSpec::Equation {
                static_head: Some(5.0),
                k_factor: Some(0.1),
            },
            11.0,
            &SystemCurveConfig::default(),
        )
        .unwrap()
        .unwrap();

        Report {
            raw: vec![RawTable {
                rotor: "A".to_owned(),
                parallel: false,
                rows: rows.clone(),
                breakdown: Vec::new(),
                best_efficiency: Some(rows[1]),
            }],
            interpolated: vec![CurveTable {
                rotor: "A".to_owned(),
                parallel: true,
                rows,
            }],
            intersections: vec![IntersectionBlock {
                system_curve: SystemCurveId::First,
                points: Vec::new(),
            }],
            system_curves: vec![system],
            warnings: Vec::new(),
        }
    }

    /// Reads one XML part out of a rendered workbook.
    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut text = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    fn chart_parts(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("xl/charts/chart"))
            .map(str::to_owned)
            .collect();
        names.sort();
        names.iter().map(|name| part(bytes, name)).collect()
    }

    fn sheet_names(bytes: &[u8]) -> Vec<String> {
        part(bytes, "xl/workbook.xml")
            .split("<sheet name=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn lays_out_every_sheet_in_order() {
        let bytes = render_workbook(&report()).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert_eq!(
            sheet_names(&bytes),
            ["Dados", "Interpolados", "Interseções", "Curva do Sistema", "Gráficos"]
        );

        let strings = part(&bytes, "xl/sharedStrings.xml");
        for text in POWER_HEADERS
            .iter()
            .copied()
            .chain(["Rotor A", "Ponto de Máxima Eficiência", "inf"])
            .chain(["Pontos de Interseção - Curva do Sistema 1", "Rotor"])
        {
            assert!(strings.contains(&format!("<t>{text}</t>")), "missing `{text}`");
        }

        let data = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(data.contains(r#"<mergeCell ref="A1:E1"/>"#));
    }

    #[test]
    fn dashes_only_parallel_series() {
        let bytes = render_workbook(&report()).unwrap();
        let charts = chart_parts(&bytes);
        assert_eq!(charts.len(), 2);
        assert!(charts.iter().all(|xml| xml.contains(r#"<a:prstDash val="dash"/>"#)));

        let mut single = report();
        single.interpolated[0].parallel = false;
        let bytes = render_workbook(&single).unwrap();
        let charts = chart_parts(&bytes);
        assert!(charts.iter().all(|xml| !xml.contains("prstDash")));
        assert!(charts.iter().any(|xml| xml.contains("Curva do Sistema 1")));
    }

    #[test]
    fn renders_without_optional_sections() {
        let mut report = report();
        report.system_curves.clear();
        report.intersections.clear();
        report.interpolated.clear();
        let bytes = render_workbook(&report).unwrap();
        assert_eq!(
            sheet_names(&bytes),
            ["Dados", "Interpolados", "Interseções", "Gráficos"]
        );
        assert!(chart_parts(&bytes).is_empty());
    }

    #[test]
    fn tracks_column_widths() {
        let mut sheet = Sheet::new("t").unwrap();
        sheet.text(0, 2, "abcd").unwrap();
        sheet.number(1, 2, 12345.678).unwrap();
        sheet.number(2, 0, f64::INFINITY).unwrap();
        assert_eq!(sheet.widths, vec![3, 0, 8]);
    }
}
