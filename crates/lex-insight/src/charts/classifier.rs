//! Chart kind selection from table shape.
//!
//! The decision is an ordered list of predicate/outcome rules evaluated
//! against a [`TableShape`]; the first rule whose predicate holds decides.
//! Cell content only matters through the shape (which columns are numeric,
//! whether any column holds percentages).

use crate::charts::ChartKind;
use crate::utils::parse_numeric_string;

/// Share of cells that must qualify for a column to count as numeric or
/// percentage-flavored.
const COLUMN_RATIO: f64 = 0.5;

/// Facts about a table that chart selection depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
    pub numeric_columns: usize,
    pub has_percentage_column: bool,
}

impl TableShape {
    pub fn of(headers: &[String], rows: &[Vec<String>]) -> Self {
        Self {
            rows: rows.len(),
            columns: headers.len(),
            numeric_columns: numeric_columns(headers, rows).len(),
            has_percentage_column: percentage_column(headers, rows).is_some(),
        }
    }

    fn single_numeric(&self) -> bool {
        self.numeric_columns == 1
    }
}

/// One entry of the decision table.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&TableShape) -> bool,
    pub outcome: Option<ChartKind>,
}

/// Decision table, in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "too small",
        applies: |s| s.rows < 2 || s.columns < 2,
        outcome: None,
    },
    Rule {
        name: "few percentages",
        applies: |s| s.single_numeric() && s.rows <= 8 && s.has_percentage_column,
        outcome: Some(ChartKind::Pie),
    },
    Rule {
        name: "few values",
        applies: |s| s.single_numeric() && s.rows <= 8,
        outcome: Some(ChartKind::Bar),
    },
    Rule {
        name: "medium list",
        applies: |s| s.single_numeric() && s.rows <= 12,
        outcome: Some(ChartKind::BarH),
    },
    Rule {
        name: "several series",
        applies: |s| s.numeric_columns >= 2,
        outcome: Some(ChartKind::GroupedBar),
    },
    Rule {
        name: "long list",
        applies: |s| s.single_numeric() && !s.has_percentage_column,
        outcome: Some(ChartKind::BarH),
    },
];

/// Chart kind for a table, or `None` when it should not be charted.
pub fn classify(headers: &[String], rows: &[Vec<String>]) -> Option<ChartKind> {
    classify_shape(&TableShape::of(headers, rows))
}

pub fn classify_shape(shape: &TableShape) -> Option<ChartKind> {
    RULES
        .iter()
        .find(|rule| (rule.applies)(shape))
        .and_then(|rule| rule.outcome)
}

/// Indices of columns where at least half the rows hold a number, once
/// currency, percent and thousands symbols are stripped. Short rows count
/// as non-numeric for the missing cells.
pub fn numeric_columns(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    (0..headers.len())
        .filter(|&col| {
            qualifies(rows, |row| {
                row.get(col)
                    .is_some_and(|cell| parse_numeric_string(cell).is_some())
            })
        })
        .collect()
}

/// First column where at least half the rows contain a percent sign.
pub fn percentage_column(headers: &[String], rows: &[Vec<String>]) -> Option<usize> {
    (0..headers.len()).find(|&col| {
        qualifies(rows, |row| row.get(col).is_some_and(|cell| cell.contains('%')))
    })
}

/// The first non-numeric column, else column 0.
pub fn label_column(headers: &[String], rows: &[Vec<String>]) -> usize {
    let numeric = numeric_columns(headers, rows);
    (0..headers.len())
        .find(|col| !numeric.contains(col))
        .unwrap_or(0)
}

fn qualifies(rows: &[Vec<String>], predicate: impl Fn(&Vec<String>) -> bool) -> bool {
    if rows.is_empty() {
        return false;
    }
    let hits = rows.iter().filter(|row| predicate(row)).count();
    hits as f64 >= rows.len() as f64 * COLUMN_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn label_value_rows(n: usize, suffix: &str) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| vec![format!("Item {}", i), format!("{}{}", (i + 1) * 10, suffix)])
            .collect()
    }

    // ==================== classify() tests ====================

    #[test]
    fn test_five_rows_one_numeric_is_bar() {
        let h = headers(&["Categoria", "Valor"]);
        assert_eq!(classify(&h, &label_value_rows(5, "")), Some(ChartKind::Bar));
    }

    #[test]
    fn test_fifteen_rows_one_numeric_is_bar_h() {
        let h = headers(&["Categoria", "Valor"]);
        assert_eq!(classify(&h, &label_value_rows(15, "")), Some(ChartKind::BarH));
    }

    #[test]
    fn test_ten_rows_is_bar_h() {
        let h = headers(&["Categoria", "Valor"]);
        assert_eq!(classify(&h, &label_value_rows(10, "")), Some(ChartKind::BarH));
        assert_eq!(classify(&h, &label_value_rows(10, "%")), Some(ChartKind::BarH));
    }

    #[test]
    fn test_few_percentages_is_pie() {
        let h = headers(&["Respuesta", "Porcentaje"]);
        assert_eq!(classify(&h, &label_value_rows(4, "%")), Some(ChartKind::Pie));
    }

    #[test]
    fn test_many_percentages_is_not_charted() {
        let h = headers(&["Respuesta", "Porcentaje"]);
        assert_eq!(classify(&h, &label_value_rows(15, "%")), None);
    }

    #[test]
    fn test_two_numeric_columns_is_grouped_bar() {
        let h = headers(&["Mes", "2023", "2024"]);
        for n in [2, 5, 20] {
            let rows: Vec<Vec<String>> = (0..n)
                .map(|i| vec![format!("M{}", i), i.to_string(), (i * 2).to_string()])
                .collect();
            assert_eq!(classify(&h, &rows), Some(ChartKind::GroupedBar), "{} rows", n);
        }
    }

    #[test]
    fn test_too_small_tables() {
        let h = headers(&["A", "B"]);
        assert_eq!(classify(&h, &label_value_rows(1, "")), None);
        assert_eq!(classify(&headers(&["A"]), &[vec!["1".to_string()], vec!["2".to_string()]]), None);
        assert_eq!(classify(&h, &[]), None);
    }

    #[test]
    fn test_no_numeric_columns() {
        let h = headers(&["Nombre", "Ciudad"]);
        let rows = vec![
            vec!["Ana".to_string(), "Lima".to_string()],
            vec!["Luis".to_string(), "Quito".to_string()],
        ];
        assert_eq!(classify(&h, &rows), None);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let h = headers(&["Categoria", "Valor"]);
        let rows = label_value_rows(7, "");
        assert_eq!(classify(&h, &rows), classify(&h, &rows));
    }

    // ==================== Column detection tests ====================

    #[test]
    fn test_numeric_columns_strip_formatting() {
        let h = headers(&["Region", "Ventas", "Cuota"]);
        let rows = vec![
            vec!["Norte".into(), "$1,200".into(), "45%".into()],
            vec!["Sur".into(), "$950".into(), "55%".into()],
        ];
        assert_eq!(numeric_columns(&h, &rows), vec![1, 2]);
        assert_eq!(percentage_column(&h, &rows), Some(2));
        assert_eq!(label_column(&h, &rows), 0);
    }

    #[test]
    fn test_label_column_falls_back_to_first() {
        let h = headers(&["A", "B"]);
        let rows = vec![vec!["1".into(), "2".into()], vec!["3".into(), "4".into()]];
        assert_eq!(label_column(&h, &rows), 0);
    }

    #[test]
    fn test_label_column_is_first_non_numeric() {
        let h = headers(&["Rank", "Name", "Score"]);
        let rows = vec![
            vec!["1".into(), "Ana".into(), "9".into()],
            vec!["2".into(), "Luis".into(), "7".into()],
        ];
        assert_eq!(label_column(&h, &rows), 1);
    }

    #[test]
    fn test_short_rows_count_as_non_numeric() {
        let h = headers(&["A", "B"]);
        let rows = vec![
            vec!["x".into(), "1".into()],
            vec!["y".into()],
            vec!["z".into()],
        ];
        assert!(numeric_columns(&h, &rows).is_empty());
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }
}
