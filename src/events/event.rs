//! Event names and payloads

use std::fmt;

use crate::document::Document;
use crate::file::FilePayload;
use crate::gateway::{Gateway, UpdateResult};

/// Event fired around a gateway operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionEvent {
    PreBatchInsert,
    PostBatchInsert,
    PreInsertFile,
    PostInsertFile,
    PreUpdateFile,
    PostUpdateFile,
    PreUpdate,
    PostUpdate,
    PreFind,
    PostFind,
    PreFindOne,
    PostFindOne,
}

impl CollectionEvent {
    pub const ALL: [CollectionEvent; 12] = [
        Self::PreBatchInsert,
        Self::PostBatchInsert,
        Self::PreInsertFile,
        Self::PostInsertFile,
        Self::PreUpdateFile,
        Self::PostUpdateFile,
        Self::PreUpdate,
        Self::PostUpdate,
        Self::PreFind,
        Self::PostFind,
        Self::PreFindOne,
        Self::PostFindOne,
    ];

    /// Event name as listeners register it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreBatchInsert => "preBatchInsert",
            Self::PostBatchInsert => "postBatchInsert",
            Self::PreInsertFile => "preInsertFile",
            Self::PostInsertFile => "postInsertFile",
            Self::PreUpdateFile => "preUpdateFile",
            Self::PostUpdateFile => "postUpdateFile",
            Self::PreUpdate => "preUpdate",
            Self::PostUpdate => "postUpdate",
            Self::PreFind => "preFind",
            Self::PostFind => "postFind",
            Self::PreFindOne => "preFindOne",
            Self::PostFindOne => "postFindOne",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }

    pub fn is_pre(&self) -> bool {
        self.as_str().starts_with("pre")
    }
}

impl fmt::Display for CollectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation-specific data carried by an event
#[derive(Debug, Clone, Copy)]
pub enum EventData<'a> {
    /// Documents about to be, or just, batch inserted
    Documents(&'a [Document]),
    /// The document passed to `insert_file`
    Document(&'a Document),
    /// Arguments of an update
    Update {
        criteria: &'a Document,
        new_obj: &'a Document,
        options: &'a Document,
    },
    /// Arguments of a find
    Query {
        query: &'a Document,
        fields: &'a Document,
    },
    /// Documents a find returned
    Results(&'a [Document]),
    /// What a find-one returned
    Found(Option<&'a Document>),
    /// What an update returned
    UpdateResult(&'a UpdateResult),
    /// The payload an insert or update stored, if any
    File(Option<&'a FilePayload>),
}

/// Arguments handed to listeners: the gateway that fired plus the data.
#[derive(Clone, Copy)]
pub struct CollectionEventArgs<'a> {
    pub gateway: &'a Gateway,
    pub data: EventData<'a>,
}

impl<'a> CollectionEventArgs<'a> {
    pub fn new(gateway: &'a Gateway, data: EventData<'a>) -> Self {
        Self { gateway, data }
    }
}

impl fmt::Debug for CollectionEventArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionEventArgs")
            .field("class", &self.gateway.class().name)
            .field("data", &self.data)
            .finish()
    }
}
