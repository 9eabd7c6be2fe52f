//! Dynamic dispatch by method name
//!
//! [`Gateway::call`] accepts the wrapped operations by name as well as the
//! native operations the gateway does not wrap ([`NativeOp`]). Anything
//! else fails with [`GatewayError::UnsupportedOperation`].

use std::vec::IntoIter;

use super::{Gateway, GatewayError, GatewayResult};
use crate::document::{Document, Value};
use crate::driver::{DriverError, NativeOp};

/// Positional arguments of one call
struct Args<'m> {
    method: &'m str,
    values: IntoIter<Value>,
    position: usize,
}

impl<'m> Args<'m> {
    fn new(method: &'m str, values: Vec<Value>) -> Self {
        Self {
            method,
            values: values.into_iter(),
            position: 0,
        }
    }

    fn invalid(&self, reason: String) -> GatewayError {
        GatewayError::invalid_arguments(self.method, reason)
    }

    fn next(&mut self) -> Option<Value> {
        self.position += 1;
        self.values.next()
    }

    /// Optional document; absent or null is an empty document
    fn document(&mut self) -> GatewayResult<Document> {
        match self.next() {
            None | Some(Value::Null) => Ok(Document::new()),
            Some(Value::Document(document)) => Ok(document),
            Some(other) => Err(self.invalid(format!(
                "argument {} must be a document, got {}",
                self.position,
                other.type_name()
            ))),
        }
    }

    fn required_document(&mut self) -> GatewayResult<Document> {
        match self.next() {
            Some(Value::Document(document)) => Ok(document),
            other => Err(self.invalid(format!(
                "argument {} must be a document, got {}",
                self.position,
                other.as_ref().map_or("nothing", Value::type_name)
            ))),
        }
    }

    fn documents(&mut self) -> GatewayResult<Vec<Document>> {
        let Some(Value::Array(items)) = self.next() else {
            return Err(self.invalid(format!("argument {} must be an array", self.position)));
        };
        items
            .into_iter()
            .map(|item| {
                item.into_document()
                    .ok_or_else(|| self.invalid("array elements must be documents".to_string()))
            })
            .collect()
    }

    fn finish(mut self) -> GatewayResult<()> {
        match self.values.next() {
            None => Ok(()),
            Some(_) => Err(self.invalid(format!(
                "expected at most {} arguments",
                self.position
            ))),
        }
    }
}

fn documents_value(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(Value::Document).collect())
}

impl Gateway {
    /// Call an operation by name with positional arguments.
    ///
    /// Wrapped operations keep their events, aliasing and file handling.
    /// Native names are parsed into a [`NativeOp`] and forwarded.
    pub fn call(&self, method: &str, args: Vec<Value>) -> GatewayResult<Value> {
        let mut args = Args::new(method, args);

        let result = match method {
            "batchInsert" => {
                let documents = args.documents()?;
                let options = args.document()?;
                args.finish()?;
                documents_value(self.batch_insert(documents, &options)?)
            }
            "insertFile" => {
                let document = args.required_document()?;
                args.finish()?;
                Value::Document(self.insert_file(document)?)
            }
            "update" | "updateFile" => {
                let criteria = args.required_document()?;
                let new_obj = args.required_document()?;
                let options = args.document()?;
                args.finish()?;
                let updated = if method == "update" {
                    self.update(&criteria, new_obj, &options)?.into_document()
                } else {
                    self.update_file(&criteria, new_obj, &options)?
                };
                Value::Document(updated)
            }
            "find" | "findOne" => {
                let query = args.document()?;
                let fields = args.document()?;
                args.finish()?;
                if method == "find" {
                    documents_value(self.find(query, &fields)?)
                } else {
                    self.find_one(query, &fields)?
                        .map(Value::Document)
                        .unwrap_or_default()
                }
            }
            "findAndRemove" => {
                let query = args.required_document()?;
                let options = args.document()?;
                args.finish()?;
                self.find_and_remove(&query, &options)?
                    .map(Value::Document)
                    .unwrap_or_default()
            }
            _ => {
                let op = Self::parse_native(&mut args)?;
                args.finish()?;
                self.native(op)?
            }
        };

        Ok(result)
    }

    fn parse_native(args: &mut Args<'_>) -> GatewayResult<NativeOp> {
        let op = match args.method {
            "insert" => NativeOp::Insert {
                document: args.required_document()?,
                options: args.document()?,
            },
            "save" => NativeOp::Save {
                document: args.required_document()?,
                options: args.document()?,
            },
            "remove" => NativeOp::Remove {
                criteria: args.document()?,
                options: args.document()?,
            },
            "count" => NativeOp::Count {
                query: args.document()?,
            },
            "drop" => NativeOp::Drop,
            "getName" => NativeOp::GetName,
            other => return Err(GatewayError::unsupported(other, Self::type_name())),
        };
        Ok(op)
    }

    /// Forward an operation the gateway does not wrap. Queries are passed
    /// as given, without aliasing or discriminator constraints.
    pub fn native(&self, op: NativeOp) -> GatewayResult<Value> {
        let method = op.method();
        self.collection.native(op).map_err(|err| match err {
            DriverError::Unsupported(_) => GatewayError::unsupported(method, Self::type_name()),
            other => other.into(),
        })
    }

    fn type_name() -> &'static str {
        std::any::type_name::<Gateway>()
    }
}
