//! Turns backend column profiles into display rows.

use crate::{Cardinality, ColumnProfiles, ColumnType};

/// Icon shown next to a column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnIcon {
    /// Numeric columns.
    Hash,
    /// Categorical columns.
    BarChart,
    /// Datetime columns.
    Calendar,
}

impl From<ColumnType> for ColumnIcon {
    fn from(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Numeric => ColumnIcon::Hash,
            ColumnType::Categorical => ColumnIcon::BarChart,
            ColumnType::Datetime => ColumnIcon::Calendar,
        }
    }
}

/// One line of the column list.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub name: String,
    pub icon: ColumnIcon,
    pub cardinality: Cardinality,
    /// e.g. `"365 unique"`.
    pub unique_text: String,
    /// e.g. `"0% missing"`. The number is printed as received.
    pub missing_text: String,
}

impl DisplayRow {
    /// Badge class/text for the cardinality.
    pub fn badge(&self) -> &'static str {
        self.cardinality.as_str()
    }
}

/// Builds the rows for `columns`, in the map's insertion order.
///
/// Every call yields a complete list; callers replace the previous one.
pub fn present(columns: &ColumnProfiles) -> Vec<DisplayRow> {
    columns
        .iter()
        .map(|(name, profile)| DisplayRow {
            name: name.clone(),
            icon: profile.column_type.into(),
            cardinality: profile.cardinality,
            unique_text: format!("{} unique", profile.unique_count),
            missing_text: format!("{}% missing", profile.missing_percentage),
        })
        .collect()
}

#[cfg(test)]
mod tests_analysis {
    use super::*;
    use crate::ColumnProfile;

    fn profile(column_type: ColumnType, unique_count: u64, missing: f64) -> ColumnProfile {
        ColumnProfile {
            column_type,
            cardinality: if unique_count <= 15 {
                Cardinality::Low
            } else {
                Cardinality::High
            },
            unique_count,
            missing_percentage: missing,
        }
    }

    #[test]
    fn datetime_column_row() {
        let mut columns = ColumnProfiles::new();
        columns.insert("date".into(), profile(ColumnType::Datetime, 365, 0.0));

        let rows = present(&columns);
        assert_eq!(
            rows,
            vec![DisplayRow {
                name: "date".into(),
                icon: ColumnIcon::Calendar,
                cardinality: Cardinality::High,
                unique_text: "365 unique".into(),
                missing_text: "0% missing".into(),
            }]
        );
        assert_eq!(rows[0].badge(), "high");
    }

    #[test]
    fn keeps_insertion_order_and_precision() {
        let mut columns = ColumnProfiles::new();
        columns.insert("zeta".into(), profile(ColumnType::Numeric, 40, 12.34));
        columns.insert("alpha".into(), profile(ColumnType::Categorical, 4, 33.3));
        columns.insert("mid".into(), profile(ColumnType::Numeric, 16, 100.0));

        let rows = present(&columns);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert_eq!(rows[0].missing_text, "12.34% missing");
        assert_eq!(rows[1].missing_text, "33.3% missing");
        assert_eq!(rows[1].icon, ColumnIcon::BarChart);
        assert_eq!(rows[1].badge(), "low");
        assert_eq!(rows[2].missing_text, "100% missing");
    }

    #[test]
    fn empty_profiles_give_no_rows() {
        assert!(present(&ColumnProfiles::new()).is_empty());
    }
}
