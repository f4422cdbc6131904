//! Shared fixtures: a realistic payroll sheet and an in-memory `.xlsx` writer.

#![allow(dead_code)]

use paystub::{CellGrid, CellRef, CellValue, Grid};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const COMPANY: &str = "DISTRIBUIDORA LA ESPERANZA, S.A.";
pub const PERIOD: &str = "PLANILLA DE SUELDOS DEL 1 AL 15 DE ENERO DE 2024";

/// One employee row: name, position, base salary, decree bonus, special bonus,
/// IGSS, ISR, advance, other deductions.
pub struct Employee {
    pub name: &'static str,
    pub position: &'static str,
    pub amounts: [f64; 7],
}

pub fn employees() -> Vec<Employee> {
    vec![
        Employee { name: "Ana Lucía López", position: "Contadora", amounts: [4000.0, 125.0, 300.0, 193.2, 0.0, 1000.0, 0.0] },
        Employee { name: "Luis Pérez", position: "Piloto", amounts: [3500.0, 125.0, 0.0, 169.05, 0.0, 800.0, 50.0] },
        Employee { name: "María José Ruiz", position: "Bodeguera", amounts: [3200.0, 125.0, 150.0, 154.56, 0.0, 0.0, 0.0] },
        Employee { name: "Carlos Méndez", position: "Vendedor", amounts: [3800.0, 125.0, 500.0, 183.54, 25.0, 1000.0, 0.0] },
        Employee { name: "Rosa Ixcot", position: "Cajera", amounts: [3100.0, 125.0, 0.0, 149.73, 0.0, 500.0, 0.0] },
        Employee { name: "Pedro Xol", position: "Guardia", amounts: [3000.0, 125.0, 0.0, 144.9, 0.0, 0.0, 100.0] },
        Employee { name: "Elena Chávez", position: "Secretaria", amounts: [3300.0, 125.0, 200.0, 159.39, 0.0, 1200.0, 0.0] },
        Employee { name: "Jorge Tzul", position: "Mensajero", amounts: [2900.0, 125.0, 0.0, 140.07, 0.0, 0.0, 0.0] },
    ]
}

/// The header labels as typed in a real sheet: two header rows, accents,
/// punctuation and a merged "BONIFICACIONES" title.
fn header(grid: &mut Grid) {
    let top = [
        "No.",
        "NOMBRE DEL EMPLEADO",
        "PUESTO",
        "ORDINARIO MENSUAL",
        "BONIFICACIONES",
        "",
        "I.G.S.S.",
        "I.S.R.",
        "ANTICIPO 1RA QUINCENA",
        "OTROS DESCUENTOS",
        "LIQUIDO A RECIBIR",
    ];
    for (col, label) in top.iter().enumerate() {
        grid.set(6, col as u32, *label);
    }
    grid.set(7, 4, "BONIFICACIÓN DECRETO 37-2001");
    grid.set(7, 5, "BONIFICACIÓN ESPECIAL");
}

/// A payroll sheet: metadata in B2/B4, header in rows 7-8, eight employees
/// from row 9 with two blank separator rows, then a totals row and a signature.
///
/// Returns the grid and the zero-based row of every employee.
pub fn payroll_sheet() -> (Grid, Vec<u32>) {
    let mut grid = Grid::new();
    grid.set(1, 1, COMPANY);
    grid.set(3, 1, PERIOD);
    header(&mut grid);

    let rows: Vec<u32> = vec![8, 9, 10, 12, 13, 14, 16, 17];
    for (i, (employee, &row)) in employees().iter().zip(&rows).enumerate() {
        grid.set(row, 0, (i + 1) as f64);
        grid.set(row, 1, employee.name);
        grid.set(row, 2, employee.position);
        for (offset, amount) in employee.amounts.iter().enumerate() {
            grid.set(row, 3 + offset as u32, *amount);
        }
        grid.set(row, 10, net_pay(employee));
    }

    grid.set(18, 1, "TOTALES");
    grid.set(18, 3, employees().iter().map(|e| e.amounts[0]).sum::<f64>());
    grid.set(21, 1, "Hecho por: ____________");

    (grid, rows)
}

pub fn net_pay(employee: &Employee) -> f64 {
    let [base, decree, special, igss, isr, advance, other] = employee.amounts;
    (base + decree + special) - (igss + isr + advance + other)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn worksheet_xml(grid: &Grid, shared: &mut Vec<String>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    if let Some(range) = grid.used_range() {
        for row in range.rows() {
            let cells: Vec<(u32, &CellValue)> = range
                .cols()
                .filter_map(|col| grid.cell(row, col).map(|v| (col, v)))
                .collect();
            if cells.is_empty() {
                continue;
            }

            xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (col, value) in cells {
                let at = CellRef::new(row, col);
                match value {
                    CellValue::Number(n) => {
                        xml.push_str(&format!(r#"<c r="{at}"><v>{n}</v></c>"#));
                    }
                    CellValue::Text(s) => {
                        shared.push(s.clone());
                        xml.push_str(&format!(r#"<c r="{at}" t="s"><v>{}</v></c>"#, shared.len() - 1));
                    }
                }
            }
            xml.push_str("</row>");
        }
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Write sheets into an `.xlsx` package held in memory.
pub fn xlsx_bytes(sheets: &[(&str, &Grid)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut overrides = String::new();
    let mut workbook_sheets = String::new();
    let mut rels = String::new();
    let mut shared = Vec::new();
    let mut parts = Vec::new();

    for (i, (name, grid)) in sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        workbook_sheets.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(name)
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
        parts.push((format!("xl/worksheets/sheet{n}.xml"), worksheet_xml(grid, &mut shared)));
    }
    let strings_rel = sheets.len() + 1;
    rels.push_str(&format!(
        r#"<Relationship Id="rId{strings_rel}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#
    ));

    let files = [
        (
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
{overrides}
</Types>"#
            ),
        ),
        (
            "_rels/.rels".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{workbook_sheets}</sheets></workbook>"#
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ),
        (
            "xl/sharedStrings.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
                shared.len(),
                shared
                    .iter()
                    .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s)))
                    .collect::<String>()
            ),
        ),
    ];

    for (path, content) in files.into_iter().chain(parts) {
        zip.start_file(path, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    buffer
}
