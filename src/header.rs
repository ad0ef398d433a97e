use crate::error::{ImportError, Result};
use crate::scalar::{PropertyMap, ScalarType};

/// A property declared by a header line: its name, its scalar type, and the
/// secondary index it belongs to, if any.
///
/// Keys are declared once per entity stream and live exactly as long as
/// that stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyKey {
    pub name: String,
    pub ty: ScalarType,
    pub index: Option<String>,
}

impl PropertyKey {
    /// Parses one trailing header field: `[indexName|]name[@typeTag]`.
    ///
    /// A missing tag means string. An unknown tag fails here, at
    /// declaration time, before any data row is touched.
    fn parse(field: &str) -> Result<Self> {
        let (index, rest) = match field.split_once('|') {
            Some((index, rest)) => (Some(index.to_string()), rest),
            None => (None, field),
        };
        let (name, ty) = match rest.split_once('@') {
            Some((name, tag)) => (name, ScalarType::parse_tag(tag)?),
            None => (rest, ScalarType::String),
        };
        Ok(Self {
            name: name.to_string(),
            ty,
            index,
        })
    }
}

/// Parses the trailing fields of a header line into the stream's declared
/// property keys. Field order defines positional binding for every data row
/// that follows.
pub fn parse_property_keys<S: AsRef<str>>(fields: &[S]) -> Result<Vec<PropertyKey>> {
    fields
        .iter()
        .map(|field| PropertyKey::parse(field.as_ref()))
        .collect()
}

/// Header-driven extraction: binds declared property keys to data-row
/// fields by position.
#[derive(Debug, Default)]
pub struct PositionalStrategy {
    keys: Vec<PropertyKey>,
}

impl PositionalStrategy {
    pub fn new(keys: Vec<PropertyKey>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[PropertyKey] {
        &self.keys
    }

    /// Builds the property map for one data row's trailing fields.
    ///
    /// Empty fields are omitted (sparse semantics), as are missing trailing
    /// fields. A field with no declared key is an arity error: the row
    /// carries data the declaration cannot account for.
    pub fn row_properties<S: AsRef<str>>(&self, fields: &[S]) -> Result<PropertyMap> {
        if fields.len() > self.keys.len() {
            return Err(ImportError::PropertyArityMismatch {
                declared: self.keys.len(),
                got: fields.len(),
            });
        }
        let mut properties = PropertyMap::default();
        for (key, field) in self.keys.iter().zip(fields) {
            let raw = field.as_ref();
            if raw.is_empty() {
                continue;
            }
            properties.insert(key.name.to_lowercase(), key.ty.convert(raw)?);
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::PropertyValue;

    #[test]
    fn bare_name_defaults_to_string() {
        let keys = parse_property_keys(&["name"]).unwrap();
        assert_eq!(
            keys,
            vec![PropertyKey {
                name: "name".to_string(),
                ty: ScalarType::String,
                index: None,
            }]
        );
    }

    #[test]
    fn type_tag_is_resolved_at_declaration() {
        let keys = parse_property_keys(&["age@long", "score@float"]).unwrap();
        assert_eq!(keys[0].ty, ScalarType::Long);
        assert_eq!(keys[1].ty, ScalarType::Float);
    }

    #[test]
    fn index_prefix_assigns_the_property_to_an_index() {
        let keys = parse_property_keys(&["people|name", "people|age@long", "plain"]).unwrap();
        assert_eq!(keys[0].index.as_deref(), Some("people"));
        assert_eq!(keys[0].name, "name");
        assert_eq!(keys[1].index.as_deref(), Some("people"));
        assert_eq!(keys[1].ty, ScalarType::Long);
        assert_eq!(keys[2].index, None);
    }

    #[test]
    fn unknown_tag_fails_the_whole_declaration() {
        let err = parse_property_keys(&["name", "age@uuid"]).unwrap_err();
        assert!(matches!(err, ImportError::UnknownType(tag) if tag == "uuid"));
    }

    #[test]
    fn fields_bind_positionally() {
        let strategy =
            PositionalStrategy::new(parse_property_keys(&["name", "age@long"]).unwrap());
        let properties = strategy.row_properties(&["hello", "25"]).unwrap();
        assert_eq!(
            properties.get("name"),
            Some(&PropertyValue::String("hello".to_string()))
        );
        assert_eq!(properties.get("age"), Some(&PropertyValue::Long(25)));
    }

    #[test]
    fn property_names_are_lower_cased() {
        let strategy = PositionalStrategy::new(parse_property_keys(&["FirstName"]).unwrap());
        let properties = strategy.row_properties(&["a"]).unwrap();
        assert!(properties.contains_key("firstname"));
    }

    #[test]
    fn empty_fields_are_omitted() {
        let strategy =
            PositionalStrategy::new(parse_property_keys(&["name", "age@long"]).unwrap());
        let properties = strategy.row_properties(&["", "25"]).unwrap();
        assert!(!properties.contains_key("name"));
        assert_eq!(properties.get("age"), Some(&PropertyValue::Long(25)));
    }

    #[test]
    fn missing_trailing_fields_are_omitted() {
        let strategy =
            PositionalStrategy::new(parse_property_keys(&["name", "age@long"]).unwrap());
        let properties = strategy.row_properties(&["a"]).unwrap();
        assert_eq!(properties.len(), 1);
        assert!(properties.contains_key("name"));
    }

    #[test]
    fn surplus_fields_are_an_arity_error() {
        let strategy = PositionalStrategy::new(parse_property_keys(&["name"]).unwrap());
        let err = strategy.row_properties(&["a", "b"]).unwrap_err();
        assert!(matches!(
            err,
            ImportError::PropertyArityMismatch {
                declared: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn values_without_any_declaration_are_an_arity_error() {
        let strategy = PositionalStrategy::default();
        assert!(strategy.row_properties::<&str>(&[]).unwrap().is_empty());
        let err = strategy.row_properties(&["stray"]).unwrap_err();
        assert!(matches!(
            err,
            ImportError::PropertyArityMismatch {
                declared: 0,
                got: 1
            }
        ));
    }

    #[test]
    fn undecodable_field_fails_the_row() {
        let strategy = PositionalStrategy::new(parse_property_keys(&["age@long"]).unwrap());
        let err = strategy.row_properties(&["old"]).unwrap_err();
        assert!(matches!(
            err,
            ImportError::InvalidValue {
                ty: ScalarType::Long,
                ..
            }
        ));
    }
}
