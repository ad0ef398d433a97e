use crate::columns::ColumnFilter;
use crate::error::{ImportError, Result};
use crate::scalar::{PropertyMap, PropertyValue, ScalarType};
use tracing::debug;

/// One column of a cursor source: its name and the source's native type
/// tag, read from metadata before any row is consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub native_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
        }
    }
}

/// Typed access to the current row of a cursor source, by column name.
///
/// `None` means the column is NULL for this row. Accessor failures are
/// source-side failures and abort the run.
pub trait CursorRow {
    fn get_string(&self, column: &str) -> anyhow::Result<Option<String>>;
    fn get_long(&self, column: &str) -> anyhow::Result<Option<i64>>;
    fn get_int(&self, column: &str) -> anyhow::Result<Option<i32>>;
    fn get_short(&self, column: &str) -> anyhow::Result<Option<i16>>;
    fn get_byte(&self, column: &str) -> anyhow::Result<Option<i8>>;
    fn get_boolean(&self, column: &str) -> anyhow::Result<Option<bool>>;
    fn get_float(&self, column: &str) -> anyhow::Result<Option<f32>>;
    fn get_double(&self, column: &str) -> anyhow::Result<Option<f64>>;
}

/// Maps a source-native column type onto the scalar registry.
///
/// Tags follow SQL type names; TEXT and REAL cover SQLite's declared
/// types. Parenthesized lengths like `VARCHAR(255)` carry no type
/// information here. A column with no declared type decodes as string.
fn scalar_for_native(native: &str) -> Option<ScalarType> {
    let tag = native.trim();
    if tag.is_empty() {
        return Some(ScalarType::String);
    }
    let tag = tag.split('(').next().unwrap_or(tag).trim();
    match tag.to_ascii_uppercase().as_str() {
        "VARCHAR" | "NVARCHAR" | "TEXT" | "STRING" | "CLOB" => Some(ScalarType::String),
        "BIGINT" => Some(ScalarType::Long),
        "INTEGER" | "INT" => Some(ScalarType::Int),
        "SMALLINT" => Some(ScalarType::Short),
        "TINYINT" => Some(ScalarType::Byte),
        "CHAR" | "CHARACTER" => Some(ScalarType::Char),
        "BOOLEAN" | "BOOL" => Some(ScalarType::Boolean),
        "FLOAT" => Some(ScalarType::Float),
        "DOUBLE" | "DOUBLE PRECISION" | "REAL" => Some(ScalarType::Double),
        _ => None,
    }
}

#[derive(Debug)]
struct ColumnBinding {
    /// Source casing, used for accessor calls.
    column: String,
    /// Lower-cased property name emitted into property maps.
    key: String,
    ty: ScalarType,
}

/// Cursor-driven extraction: resolves, once, which metadata columns become
/// properties and which accessor decodes each, then builds one property map
/// per row.
#[derive(Debug, Default)]
pub struct ColumnStrategy {
    filter: ColumnFilter,
    bindings: Vec<ColumnBinding>,
    initialized: bool,
}

impl ColumnStrategy {
    /// Strategy that excludes the given reserved (structural) columns.
    pub fn excluding<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            filter: ColumnFilter::excluding(reserved),
            bindings: Vec::new(),
            initialized: false,
        }
    }

    /// Strategy that keeps only the given property columns, ignoring any
    /// reserved set.
    pub fn allowing<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            filter: ColumnFilter::allowing(columns),
            bindings: Vec::new(),
            initialized: false,
        }
    }

    /// Reads column metadata, exactly once per stream.
    ///
    /// Every selected column resolves its converter here; data rows never
    /// re-dispatch on native type names. In allow-list mode, every
    /// allow-listed column must exist in the metadata.
    pub fn initialize(&mut self, columns: &[ColumnDescriptor]) -> Result<()> {
        if self.initialized {
            return Err(ImportError::DuplicateHeaderDeclaration);
        }
        self.initialized = true;
        for column in columns {
            if !self.filter.is_property_column(&column.name) {
                continue;
            }
            let ty = scalar_for_native(&column.native_type).ok_or_else(|| {
                ImportError::UnknownType(format!(
                    "{} (column {:?})",
                    column.native_type, column.name
                ))
            })?;
            debug!(column = %column.name, ty = %ty, "Bound property column");
            self.bindings.push(ColumnBinding {
                column: column.name.clone(),
                key: column.name.to_lowercase(),
                ty,
            });
        }
        if let Some(declared) = self.filter.allowed_count() {
            if self.bindings.len() < declared {
                return Err(ImportError::PropertyArityMismatch {
                    declared,
                    got: self.bindings.len(),
                });
            }
        }
        Ok(())
    }

    /// Builds the property map for the cursor's current row. NULL values
    /// are omitted; keys are lower-cased.
    pub fn row_properties(&self, row: &dyn CursorRow) -> Result<PropertyMap> {
        let mut properties = PropertyMap::default();
        for binding in &self.bindings {
            let value = extract(binding, row).map_err(ImportError::failed)?;
            if let Some(value) = value {
                properties.insert(binding.key.clone(), value);
            }
        }
        Ok(properties)
    }
}

fn extract(binding: &ColumnBinding, row: &dyn CursorRow) -> anyhow::Result<Option<PropertyValue>> {
    let column = binding.column.as_str();
    Ok(match binding.ty {
        ScalarType::String => row.get_string(column)?.map(PropertyValue::String),
        ScalarType::Long => row.get_long(column)?.map(PropertyValue::Long),
        ScalarType::Int => row.get_int(column)?.map(PropertyValue::Int),
        ScalarType::Short => row.get_short(column)?.map(PropertyValue::Short),
        ScalarType::Byte => row.get_byte(column)?.map(PropertyValue::Byte),
        ScalarType::Char => row
            .get_string(column)?
            .and_then(|s| s.chars().next())
            .map(PropertyValue::Char),
        ScalarType::Boolean => row.get_boolean(column)?.map(PropertyValue::Boolean),
        ScalarType::Float => row.get_float(column)?.map(PropertyValue::Float),
        ScalarType::Double => row.get_double(column)?.map(PropertyValue::Double),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    /// Row backed by a map of column text, decoding on demand.
    #[derive(Default)]
    struct FakeRow {
        values: FxHashMap<String, String>,
    }

    impl FakeRow {
        fn with(mut self, column: &str, value: &str) -> Self {
            self.values.insert(column.to_string(), value.to_string());
            self
        }

        fn parsed<T: std::str::FromStr>(&self, column: &str) -> anyhow::Result<Option<T>> {
            match self.values.get(column) {
                None => Ok(None),
                Some(raw) => raw
                    .parse()
                    .map(Some)
                    .map_err(|_| anyhow::anyhow!("bad value in column {column}: {raw:?}")),
            }
        }
    }

    impl CursorRow for FakeRow {
        fn get_string(&self, column: &str) -> anyhow::Result<Option<String>> {
            Ok(self.values.get(column).cloned())
        }
        fn get_long(&self, column: &str) -> anyhow::Result<Option<i64>> {
            self.parsed(column)
        }
        fn get_int(&self, column: &str) -> anyhow::Result<Option<i32>> {
            self.parsed(column)
        }
        fn get_short(&self, column: &str) -> anyhow::Result<Option<i16>> {
            self.parsed(column)
        }
        fn get_byte(&self, column: &str) -> anyhow::Result<Option<i8>> {
            self.parsed(column)
        }
        fn get_boolean(&self, column: &str) -> anyhow::Result<Option<bool>> {
            self.parsed(column)
        }
        fn get_float(&self, column: &str) -> anyhow::Result<Option<f32>> {
            self.parsed(column)
        }
        fn get_double(&self, column: &str) -> anyhow::Result<Option<f64>> {
            self.parsed(column)
        }
    }

    fn descriptors(columns: &[(&str, &str)]) -> Vec<ColumnDescriptor> {
        columns
            .iter()
            .map(|(name, ty)| ColumnDescriptor::new(*name, *ty))
            .collect()
    }

    #[test]
    fn reserved_columns_never_become_properties() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        strategy
            .initialize(&descriptors(&[("id", "BIGINT"), ("name", "VARCHAR")]))
            .unwrap();

        let row = FakeRow::default().with("id", "1").with("name", "hello");
        let properties = strategy.row_properties(&row).unwrap();
        assert!(!properties.contains_key("id"));
        assert_eq!(
            properties.get("name"),
            Some(&PropertyValue::String("hello".to_string()))
        );
    }

    #[test]
    fn native_types_resolve_to_exact_widths() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        strategy
            .initialize(&descriptors(&[
                ("id", "BIGINT"),
                ("s", "VARCHAR"),
                ("l", "BIGINT"),
                ("i", "INTEGER"),
                ("sh", "SMALLINT"),
                ("b", "TINYINT"),
                ("f", "FLOAT"),
                ("d", "DOUBLE"),
                ("bo", "BOOLEAN"),
            ]))
            .unwrap();

        let row = FakeRow::default()
            .with("id", "1")
            .with("s", "hello")
            .with("l", "9999999999999999")
            .with("i", "888888888")
            .with("sh", "777")
            .with("b", "66")
            .with("f", "0.2345")
            .with("d", "0.1234")
            .with("bo", "true");
        let properties = strategy.row_properties(&row).unwrap();

        assert_eq!(
            properties.get("s"),
            Some(&PropertyValue::String("hello".to_string()))
        );
        assert_eq!(
            properties.get("l"),
            Some(&PropertyValue::Long(9999999999999999))
        );
        assert_eq!(properties.get("i"), Some(&PropertyValue::Int(888888888)));
        assert_eq!(properties.get("sh"), Some(&PropertyValue::Short(777)));
        assert_eq!(properties.get("b"), Some(&PropertyValue::Byte(66)));
        assert_eq!(properties.get("f"), Some(&PropertyValue::Float(0.2345f32)));
        assert_eq!(properties.get("d"), Some(&PropertyValue::Double(0.1234f64)));
        assert_eq!(properties.get("bo"), Some(&PropertyValue::Boolean(true)));
    }

    #[test]
    fn null_columns_are_omitted() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        strategy
            .initialize(&descriptors(&[
                ("id", "BIGINT"),
                ("name", "VARCHAR"),
                ("age", "BIGINT"),
            ]))
            .unwrap();

        let row = FakeRow::default().with("id", "1").with("name", "a");
        let properties = strategy.row_properties(&row).unwrap();
        assert!(properties.contains_key("name"));
        assert!(!properties.contains_key("age"));
    }

    #[test]
    fn property_names_are_lower_cased() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        strategy
            .initialize(&descriptors(&[("FirstName", "VARCHAR")]))
            .unwrap();

        let row = FakeRow::default().with("FirstName", "a");
        let properties = strategy.row_properties(&row).unwrap();
        assert!(properties.contains_key("firstname"));
    }

    #[test]
    fn allow_list_narrows_the_selection() {
        let mut strategy = ColumnStrategy::allowing(["name"]);
        strategy
            .initialize(&descriptors(&[
                ("id", "BIGINT"),
                ("name", "VARCHAR"),
                ("age", "BIGINT"),
            ]))
            .unwrap();

        let row = FakeRow::default()
            .with("id", "1")
            .with("name", "a")
            .with("age", "25");
        let properties = strategy.row_properties(&row).unwrap();
        assert_eq!(properties.len(), 1);
        assert!(properties.contains_key("name"));
    }

    #[test]
    fn allow_listed_column_must_exist() {
        let mut strategy = ColumnStrategy::allowing(["name", "nickname"]);
        let err = strategy
            .initialize(&descriptors(&[("id", "BIGINT"), ("name", "VARCHAR")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::PropertyArityMismatch {
                declared: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn unknown_native_type_fails_at_initialize() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        let err = strategy
            .initialize(&descriptors(&[("payload", "BLOB")]))
            .unwrap_err();
        assert!(matches!(err, ImportError::UnknownType(tag) if tag.contains("BLOB")));
    }

    #[test]
    fn initialize_is_guarded_against_reuse() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        let columns = descriptors(&[("name", "VARCHAR")]);
        strategy.initialize(&columns).unwrap();
        let err = strategy.initialize(&columns).unwrap_err();
        assert!(matches!(err, ImportError::DuplicateHeaderDeclaration));
    }

    #[test]
    fn varchar_lengths_are_ignored() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        strategy
            .initialize(&descriptors(&[("name", "VARCHAR(255)")]))
            .unwrap();
        let row = FakeRow::default().with("name", "a");
        assert!(strategy.row_properties(&row).unwrap().contains_key("name"));
    }

    #[test]
    fn untyped_columns_decode_as_string() {
        let mut strategy = ColumnStrategy::excluding(["id"]);
        strategy.initialize(&descriptors(&[("note", "")])).unwrap();
        let row = FakeRow::default().with("note", "free-form");
        assert_eq!(
            strategy.row_properties(&row).unwrap().get("note"),
            Some(&PropertyValue::String("free-form".to_string()))
        );
    }
}
