use rustc_hash::FxHashSet;

/// Decides which source columns become graph properties.
///
/// Reserved (structural) columns are excluded, unless an explicit
/// allow-list is configured -- then only allow-listed columns are kept and
/// the reserved set is ignored entirely. Matching is case-insensitive;
/// names are normalized once at construction so each lookup is a plain set
/// probe. Classification preserves the source's original casing.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilter {
    reserved: FxHashSet<String>,
    allowed: Option<FxHashSet<String>>,
}

impl ColumnFilter {
    /// Filter that excludes the given structural columns; everything else
    /// is a property column.
    pub fn excluding<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            reserved: normalize(reserved),
            allowed: None,
        }
    }

    /// Filter that keeps only the given columns, ignoring any reserved set.
    pub fn allowing<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            reserved: FxHashSet::default(),
            allowed: Some(normalize(allowed)),
        }
    }

    pub fn is_property_column(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        match &self.allowed {
            Some(allowed) => allowed.contains(&key),
            None => !self.reserved.contains(&key),
        }
    }

    /// Number of allow-listed columns, if this filter is in allow-list mode.
    pub fn allowed_count(&self) -> Option<usize> {
        self.allowed.as_ref().map(|allowed| allowed.len())
    }

    /// Returns the property columns out of `columns`, in input order,
    /// preserving the source casing.
    pub fn classify<'a, S: AsRef<str>>(&self, columns: &'a [S]) -> Vec<&'a str> {
        columns
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| self.is_property_column(name))
            .collect()
    }
}

fn normalize<I, S>(names: I) -> FxHashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect()
}
