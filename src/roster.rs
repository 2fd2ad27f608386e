use crate::error::PlanError;
use anyhow::{bail, Context};
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Spreadsheet date: the serial number orders it, the text is what gets shown.
    Date { serial: f64, text: String },
}

impl Cell {
    /// Type inference for untyped sources (csv).
    pub fn from_text(raw: &str) -> Cell {
        let t = raw.trim();
        if t.is_empty() {
            return Cell::Empty;
        }
        if let Ok(v) = t.parse::<i64>() {
            return Cell::Int(v);
        }
        if let Ok(v) = t.parse::<f64>() {
            if v.is_finite() {
                return Cell::Float(v);
            }
        }
        match t.to_ascii_lowercase().as_str() {
            "true" => Cell::Bool(true),
            "false" => Cell::Bool(false),
            _ => Cell::Text(t.to_string()),
        }
    }

    fn from_sheet(data: &Data) -> Cell {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::Int(v) => Cell::Int(*v),
            Data::Float(v) if v.is_finite() => Cell::Float(*v),
            Data::Float(_) => Cell::Empty,
            Data::Bool(v) => Cell::Bool(*v),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::DateTime(dt) if dt.is_datetime() && dt.as_f64().is_finite() => sheet_date(dt),
            Data::DateTime(dt) => Cell::Float(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Cell::Date { serial, .. } => Some(*serial),
            Cell::Empty | Cell::Text(_) => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
            Cell::Float(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(v) => v.to_string(),
            Cell::Date { text, .. } => text.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Empty => serde_json::Value::Null,
            Cell::Int(v) => json!(v),
            Cell::Float(v) => json!(v),
            Cell::Text(s) => json!(s),
            Cell::Bool(v) => json!(v),
            Cell::Date { text, .. } => json!(text),
        }
    }

    /// Inclusion flag semantics: true, non-zero numbers, or a yes-like word.
    pub fn is_truthy(&self) -> bool {
        match self {
            Cell::Bool(v) => *v,
            Cell::Int(v) => *v != 0,
            Cell::Float(v) => *v != 0.0,
            Cell::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "y" | "x" | "1"
            ),
            Cell::Date { .. } => true,
            Cell::Empty => false,
        }
    }

    /// Student ids are numeric; integral floats lose the `.0`, fractions are truncated.
    pub fn to_student_id(&self) -> Option<String> {
        match self {
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) => float_id(*v),
            Cell::Text(s) => {
                let t = s.trim();
                if let Ok(v) = t.parse::<i64>() {
                    return Some(v.to_string());
                }
                t.parse::<f64>().ok().and_then(float_id)
            }
            Cell::Empty | Cell::Bool(_) | Cell::Date { .. } => None,
        }
    }
}

// ISO date, with the time only when the serial carries one.
fn sheet_date(dt: &ExcelDateTime) -> Cell {
    let (y, mo, d, h, mi, s, _) = dt.to_ymd_hms_milli();
    let text = if (h, mi, s) == (0, 0, 0) {
        format!("{:04}-{:02}-{:02}", y, mo, d)
    } else {
        format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}", y, mo, d, h, mi, s)
    };
    Cell::Date {
        serial: dt.as_f64(),
        text,
    }
}

fn float_id(v: f64) -> Option<String> {
    if !v.is_finite() || v.abs() >= 9.0e18 {
        return None;
    }
    Some((v.trunc() as i64).to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RosterTable {
    /// Rows are padded or cut to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Empty);
                r
            })
            .collect();
        Self { columns, rows }
    }

    fn from_grid(header: Vec<Cell>, body: Vec<Vec<Cell>>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut columns = Vec::with_capacity(header.len());
        for (i, cell) in header.iter().enumerate() {
            let base = match cell.display().trim() {
                "" => format!("Column {}", i + 1),
                t => t.to_string(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            columns.push(name);
        }
        let rows = body
            .into_iter()
            .filter(|r| r.iter().any(|c| !c.is_empty()))
            .collect();
        Self::new(columns, rows)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Adds the inclusion column (all true) when missing. Returns whether it already existed.
    pub fn ensure_include_column(&mut self, include_column: &str) -> bool {
        if self.column_index(include_column).is_some() {
            return true;
        }
        self.columns.push(include_column.to_string());
        for row in &mut self.rows {
            row.push(Cell::Bool(true));
        }
        false
    }

    pub fn is_included(&self, row: usize, include_column: &str) -> bool {
        match self.column_index(include_column) {
            Some(col) => self.rows[row][col].is_truthy(),
            None => true,
        }
    }

    pub fn included_count(&self, include_column: &str) -> usize {
        (0..self.rows.len())
            .filter(|&r| self.is_included(r, include_column))
            .count()
    }

    pub fn set_included(
        &mut self,
        include_column: &str,
        rows: &[usize],
        included: bool,
    ) -> Result<usize, PlanError> {
        if let Some(bad) = rows.iter().find(|&&r| r >= self.rows.len()) {
            return Err(PlanError::validation(format!(
                "row index {} out of range (table has {} rows)",
                bad,
                self.rows.len()
            )));
        }
        self.ensure_include_column(include_column);
        let col = self
            .column_index(include_column)
            .ok_or_else(|| PlanError::validation("inclusion column missing"))?;
        for &r in rows {
            self.rows[r][col] = Cell::Bool(included);
        }
        Ok(self.included_count(include_column))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn is_descending(self) -> bool {
        self == SortDirection::Descending
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RosterQuery<'a> {
    /// `None` keeps file order.
    pub sort_by: Option<&'a str>,
    pub direction: SortDirection,
    pub id_column: &'a str,
    pub include_column: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmittedRoster {
    pub ids: Vec<String>,
    pub duplicates_dropped: usize,
}

// Empty cells go last in both directions.
fn compare_cells(a: &Cell, b: &Cell, direction: SortDirection) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.display().cmp(&b.display()),
            };
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
    }
}

/// Stable row permutation for the requested sort. Does not touch the table.
pub fn sorted_order(
    table: &RosterTable,
    sort_by: Option<&str>,
    direction: SortDirection,
) -> Result<Vec<usize>, PlanError> {
    let mut order: Vec<usize> = (0..table.rows.len()).collect();
    let Some(field) = sort_by else {
        return Ok(order);
    };
    let col = table
        .column_index(field)
        .ok_or_else(|| PlanError::validation(format!("unknown sort column: {}", field)))?;
    order.sort_by(|&a, &b| compare_cells(&table.rows[a][col], &table.rows[b][col], direction));
    Ok(order)
}

/// First column other than the inclusion flag; the sort used when none was chosen.
pub fn default_sort_column<'a>(table: &'a RosterTable, include_column: &str) -> Option<&'a str> {
    table
        .columns
        .iter()
        .map(String::as_str)
        .find(|c| *c != include_column)
}

/// Included rows, sorted, projected to unique student ids.
pub fn admitted_ids(table: &RosterTable, query: &RosterQuery<'_>) -> Result<AdmittedRoster, PlanError> {
    let id_col = table.column_index(query.id_column).ok_or_else(|| {
        PlanError::validation(format!("unknown id column: {}", query.id_column))
    })?;
    if query.sort_by == Some(query.include_column) {
        return Err(PlanError::validation(format!(
            "cannot sort by the inclusion column {}",
            query.include_column
        )));
    }
    let order = sorted_order(table, query.sort_by, query.direction)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = AdmittedRoster::default();
    for r in order {
        if !table.is_included(r, query.include_column) {
            continue;
        }
        let Some(id) = table.rows[r][id_col].to_student_id() else {
            continue;
        };
        if seen.insert(id.clone()) {
            out.ids.push(id);
        } else {
            out.duplicates_dropped += 1;
        }
    }
    Ok(out)
}

/// Reads the first worksheet (or a csv file). The first row is the header.
pub fn load_table(path: &Path) -> anyhow::Result<RosterTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_workbook(path)?,
        other => bail!("unsupported roster file type: .{}", other),
    };
    if table.columns.is_empty() {
        bail!("roster file has no header row: {}", path.to_string_lossy());
    }
    Ok(table)
}

fn load_workbook(path: &Path) -> anyhow::Result<RosterTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.to_string_lossy()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("failed to read first worksheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        bail!("worksheet is empty");
    };
    let header: Vec<Cell> = header.iter().map(Cell::from_sheet).collect();
    let body: Vec<Vec<Cell>> = rows
        .map(|r| r.iter().map(Cell::from_sheet).collect())
        .collect();
    Ok(RosterTable::from_grid(header, body))
}

fn load_csv(path: &Path) -> anyhow::Result<RosterTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open csv {}", path.to_string_lossy()))?;

    let mut records = reader.records();
    let header = match records.next() {
        Some(rec) => rec.context("failed to read csv header")?,
        None => bail!("csv file is empty"),
    };
    let header: Vec<Cell> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            match h.trim() {
                "" => Cell::Empty,
                t => Cell::Text(t.to_string()),
            }
        })
        .collect();

    let mut body = Vec::new();
    for (line, rec) in records.enumerate() {
        let rec = rec.with_context(|| format!("failed to read csv record {}", line + 2))?;
        body.push(rec.iter().map(Cell::from_text).collect());
    }
    Ok(RosterTable::from_grid(header, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RosterTable {
        RosterTable::new(
            vec!["Name".into(), "ID number".into(), "Grade".into()],
            vec![
                vec![Cell::Text("Ada".into()), Cell::Float(1003.0), Cell::Int(90)],
                vec![Cell::Text("Bo".into()), Cell::Int(1001), Cell::Int(75)],
                vec![Cell::Text("Cy".into()), Cell::Empty, Cell::Int(90)],
                vec![Cell::Text("Di".into()), Cell::Text("1002".into()), Cell::Empty],
                vec![Cell::Text("Ed".into()), Cell::Text("n/a".into()), Cell::Int(60)],
            ],
        )
    }

    fn query<'a>(sort_by: Option<&'a str>, direction: SortDirection) -> RosterQuery<'a> {
        RosterQuery {
            sort_by,
            direction,
            id_column: "ID number",
            include_column: "Include?",
        }
    }

    #[test]
    fn ids_are_coerced_and_unparseable_dropped() {
        let t = table();
        let got = admitted_ids(&t, &query(None, SortDirection::Ascending)).expect("admitted");
        assert_eq!(got.ids, vec!["1003", "1001", "1002"]);
    }

    #[test]
    fn sort_is_stable_and_empty_last() {
        let t = table();
        let asc = sorted_order(&t, Some("Grade"), SortDirection::Ascending).expect("sort");
        assert_eq!(asc, vec![4, 1, 0, 2, 3]);
        let desc = sorted_order(&t, Some("Grade"), SortDirection::Descending).expect("sort");
        // Ada and Cy tie at 90 and keep file order; the empty grade stays last.
        assert_eq!(desc, vec![0, 2, 1, 4, 3]);
    }

    #[test]
    fn default_sort_skips_the_inclusion_column() {
        let mut t = RosterTable::new(vec!["Include?".into(), "Name".into()], Vec::new());
        assert_eq!(default_sort_column(&t, "Include?"), Some("Name"));
        t.columns.truncate(1);
        assert_eq!(default_sort_column(&t, "Include?"), None);
    }

    #[test]
    fn unknown_columns_are_validation_errors() {
        let t = table();
        let mut q = query(Some("Nope"), SortDirection::Ascending);
        assert!(matches!(admitted_ids(&t, &q), Err(PlanError::Validation(_))));
        q.sort_by = None;
        q.id_column = "Student";
        assert!(matches!(admitted_ids(&t, &q), Err(PlanError::Validation(_))));
    }

    #[test]
    fn inclusion_flag_and_duplicates() {
        let mut t = table();
        assert!(!t.ensure_include_column("Include?"));
        t.rows.push(vec![
            Cell::Text("Ada again".into()),
            Cell::Int(1003),
            Cell::Int(10),
            Cell::Bool(true),
        ]);
        let count = t.set_included("Include?", &[1], false).expect("toggle");
        assert_eq!(count, 5);
        let got = admitted_ids(&t, &query(None, SortDirection::Ascending)).expect("admitted");
        assert_eq!(got.ids, vec!["1003", "1002"]);
        assert_eq!(got.duplicates_dropped, 1);
        assert!(t.set_included("Include?", &[99], true).is_err());
    }

    #[test]
    fn truthiness_of_flag_cells() {
        assert!(Cell::Text("Yes".into()).is_truthy());
        assert!(Cell::Int(1).is_truthy());
        assert!(!Cell::Text("no".into()).is_truthy());
        assert!(!Cell::Empty.is_truthy());
    }

    #[test]
    fn csv_loading_infers_types() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = dir.path().join("students.csv");
        std::fs::write(
            &p,
            "\u{feff}Name,ID number,,Include?\nAda,1001,x,true\n,,,\nBo,1002.0,,FALSE\n",
        )
        .expect("write csv");
        let t = load_table(&p).expect("load csv");
        assert_eq!(t.columns, vec!["Name", "ID number", "Column 3", "Include?"]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.rows[1][1], Cell::Float(1002.0));
        assert!(!t.is_included(1, "Include?"));
    }

    #[test]
    fn sheet_dates_show_as_iso_and_sort_by_serial() {
        use calamine::ExcelDateTimeType;
        let birthday = Cell::from_sheet(&Data::DateTime(ExcelDateTime::new(
            39521.0,
            ExcelDateTimeType::DateTime,
            false,
        )));
        assert_eq!(birthday.display(), "2008-03-14");
        assert_eq!(birthday.to_json(), json!("2008-03-14"));
        assert_eq!(birthday.to_student_id(), None);

        let later = Cell::from_sheet(&Data::DateTime(ExcelDateTime::new(
            39522.5,
            ExcelDateTimeType::DateTime,
            false,
        )));
        assert_eq!(later.display(), "2008-03-15 12:00:00");

        let t = RosterTable::new(vec!["Born".into()], vec![vec![later], vec![Cell::Empty], vec![birthday]]);
        let order = sorted_order(&t, Some("Born"), SortDirection::Ascending).expect("sort");
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn unsupported_extension_fails() {
        let err = load_table(Path::new("students.txt")).expect_err("should fail");
        assert!(err.to_string().contains("unsupported"));
    }
}
