//! Discriminator injection and field aliasing

use crate::document::{Document, Value};
use crate::mapping::MappedType;

/// Discriminator values a query on `class` must accept: the type's own
/// value followed by one value per registered subclass.
///
/// Subclass values come from a reverse lookup in the discriminator map.
/// When several entries name the same subclass the first one in map order
/// wins. A subclass with no entry contributes nothing, and so does a type
/// without its own value.
pub fn class_discriminator_values(class: &MappedType) -> Vec<String> {
    class
        .discriminator_value
        .iter()
        .map(String::as_str)
        .chain(
            class
                .sub_classes
                .iter()
                .filter_map(|sub| class.discriminator_value_for(sub)),
        )
        .map(str::to_string)
        .collect()
}

/// Rewrites queries for one mapped type. Pure: never touches the store.
#[derive(Debug, Clone, Copy)]
pub struct QueryRewriter<'a> {
    class: &'a MappedType,
    prefix: &'a str,
}

impl<'a> QueryRewriter<'a> {
    /// `prefix` is the operator keyword prefix, used for the `in` constraint
    pub fn new(class: &'a MappedType, prefix: &'a str) -> Self {
        Self { class, prefix }
    }

    /// Constrain the discriminator field to the type's hierarchy unless the
    /// caller already constrains it.
    pub fn with_discriminator(&self, mut query: Document) -> Document {
        let Some(field) = self.class.discriminator_field.as_deref() else {
            return query;
        };
        if query.contains_key(field) {
            return query;
        }

        let values = class_discriminator_values(self.class);
        if values.is_empty() {
            return query;
        }

        let values: Vec<Value> = values.into_iter().map(Value::from).collect();
        query.insert(
            field,
            Document::new().with(format!("{}in", self.prefix), values),
        );
        query
    }

    /// Replace logical field names with their on-disk names. Unmapped keys
    /// are left alone; replaced keys move to the end.
    pub fn rewrite(&self, mut document: Document) -> Document {
        let aliased: Vec<(String, String)> = document
            .keys()
            .filter_map(|key| {
                self.class
                    .field_mapping(key)
                    .filter(|mapping| mapping.is_aliased())
                    .map(|mapping| (key.to_string(), mapping.name.clone()))
            })
            .collect();

        for (logical, on_disk) in aliased {
            document.rename(&logical, on_disk);
        }
        document
    }

    /// Discriminator injection followed by aliasing, as `find` and
    /// `find_one` apply it.
    pub fn prepare_query(&self, query: Document) -> Document {
        self.rewrite(self.with_discriminator(query))
    }
}
