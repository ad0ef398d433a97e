use crate::header::PropertyKey;
use crate::scalar::PropertyMap;
use crate::sink::IndexSink;

/// One secondary index and the lower-cased property names mirrored into it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGroup {
    pub name: String,
    pub keys: Vec<String>,
}

/// Groups header-declared index assignments and forwards each imported
/// node's matching property subset to the index sink.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    groups: Vec<IndexGroup>,
}

impl IndexBuilder {
    /// Builds the index groups from the stream's declared keys. Runs once,
    /// right after header declaration, before any node is recorded.
    pub fn from_keys(keys: &[PropertyKey]) -> Self {
        let mut groups: Vec<IndexGroup> = Vec::new();
        for key in keys {
            let Some(index) = &key.index else { continue };
            let member = key.name.to_lowercase();
            match groups.iter_mut().find(|group| &group.name == index) {
                Some(group) => group.keys.push(member),
                None => groups.push(IndexGroup {
                    name: index.clone(),
                    keys: vec![member],
                }),
            }
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[IndexGroup] {
        &self.groups
    }

    /// Forwards, per configured group, the subset of `properties` that
    /// belongs to it. Missing members are simply absent from the subset.
    /// Returns the number of entries forwarded.
    pub fn record_node(
        &self,
        id: i64,
        properties: &PropertyMap,
        sink: &mut dyn IndexSink,
    ) -> anyhow::Result<u64> {
        let mut entries = 0;
        for group in &self.groups {
            let subset: PropertyMap = group
                .keys
                .iter()
                .filter_map(|key| {
                    properties
                        .get(key)
                        .map(|value| (key.clone(), value.clone()))
                })
                .collect();
            sink.add_to_index(&group.name, id, &subset)?;
            entries += 1;
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_property_keys;
    use crate::scalar::PropertyValue;
    use crate::sink::MemorySink;

    fn builder(fields: &[&str]) -> IndexBuilder {
        IndexBuilder::from_keys(&parse_property_keys(fields).unwrap())
    }

    #[test]
    fn groups_keys_by_index_name() {
        let builder = builder(&["people|name", "people|age@long", "places|city", "plain"]);
        let groups = builder.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "people");
        assert_eq!(groups[0].keys, vec!["name", "age"]);
        assert_eq!(groups[1].name, "places");
        assert_eq!(groups[1].keys, vec!["city"]);
    }

    #[test]
    fn no_index_declarations_means_no_groups() {
        let builder = builder(&["name", "age@long"]);
        assert!(builder.is_empty());

        let mut sink = MemorySink::new();
        let entries = builder
            .record_node(1, &PropertyMap::default(), &mut sink)
            .unwrap();
        assert_eq!(entries, 0);
        assert!(sink.index_entries.is_empty());
    }

    #[test]
    fn record_node_forwards_the_group_subset() {
        let builder = builder(&["people|name", "age@long"]);
        let mut properties = PropertyMap::default();
        properties.insert(
            "name".to_string(),
            PropertyValue::String("hello".to_string()),
        );
        properties.insert("age".to_string(), PropertyValue::Long(25));

        let mut sink = MemorySink::new();
        builder.record_node(7, &properties, &mut sink).unwrap();

        assert_eq!(sink.index_entries.len(), 1);
        let (index, id, subset) = &sink.index_entries[0];
        assert_eq!(index, "people");
        assert_eq!(*id, 7);
        assert_eq!(subset.len(), 1);
        assert_eq!(
            subset.get("name"),
            Some(&PropertyValue::String("hello".to_string()))
        );
    }

    #[test]
    fn missing_members_are_absent_from_the_subset() {
        let builder = builder(&["people|name", "people|age@long"]);
        let mut properties = PropertyMap::default();
        properties.insert("age".to_string(), PropertyValue::Long(25));

        let mut sink = MemorySink::new();
        builder.record_node(2, &properties, &mut sink).unwrap();

        let (_, _, subset) = &sink.index_entries[0];
        assert!(!subset.contains_key("name"));
        assert_eq!(subset.get("age"), Some(&PropertyValue::Long(25)));
    }
}
