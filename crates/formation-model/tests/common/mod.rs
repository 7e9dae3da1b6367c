#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use formation::{unflatten, ValueTree};
use formation_model::{FormModel, RelationStore, Result, SlugLookup, SpecialType};

pub type Row = BTreeMap<String, ValueTree>;

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), ValueTree::from(*v)))
        .collect()
}

/// Builds top-level input from dotted form pairs.
pub fn input(pairs: &[(&str, &str)]) -> Row {
    match unflatten(pairs.iter().copied()) {
        ValueTree::Map(fields) => fields,
        other => panic!("Expected a mapping, got {other:?}"),
    }
}

pub struct Role {
    pub id: i64,
    pub name: &'static str,
    pub since: &'static str,
    pub level: &'static str,
}

impl FormModel for Role {
    fn model_name(&self) -> &str {
        "Role"
    }

    fn id(&self) -> Option<i64> {
        Some(self.id)
    }

    fn attributes(&self) -> Row {
        let mut attributes = row(&[("name", self.name), ("since", self.since)]);
        attributes.insert("id".to_string(), self.id.into());
        attributes
    }

    fn special_types(&self) -> BTreeMap<String, SpecialType> {
        BTreeMap::from([("since".to_string(), SpecialType::Date)])
    }

    fn pivot(&self) -> Option<Row> {
        Some(row(&[("level", self.level)]))
    }
}

pub struct User {
    pub id: Option<i64>,
    pub name: &'static str,
    pub roles: Vec<Role>,
}

impl FormModel for User {
    fn model_name(&self) -> &str {
        "User"
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn attributes(&self) -> Row {
        row(&[("name", self.name)])
    }

    fn special_types(&self) -> BTreeMap<String, SpecialType> {
        BTreeMap::from([
            ("handle".to_string(), SpecialType::UniqueSlug),
            ("joined_on".to_string(), SpecialType::Date),
        ])
    }

    fn relations(&self) -> Vec<String> {
        vec!["userRoles".to_string()]
    }

    fn related(&self, relation: &str) -> Vec<&dyn FormModel> {
        match relation {
            "userRoles" => self.roles.iter().map(|r| r as &dyn FormModel).collect(),
            _ => Vec::new(),
        }
    }
}

pub fn user() -> User {
    User {
        id: Some(7),
        name: "Ann",
        roles: vec![
            Role {
                id: 1,
                name: "Admin",
                since: "2021-06-01",
                level: "1",
            },
            Role {
                id: 2,
                name: "Editor",
                since: "0000-00-00",
                level: "2",
            },
        ],
    }
}

/// Records and join-table rows held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub items: BTreeMap<i64, Row>,
    pub pivots: Vec<Row>,
    pub slugs: BTreeSet<String>,
    pub next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 100,
            ..Self::default()
        }
    }

    pub fn with_pivot(mut self, pivot: Row) -> Self {
        self.pivots.push(pivot);
        self
    }
}

impl RelationStore for MemoryStore {
    fn update_item(&mut self, _relation: &str, id: i64, data: &Row) -> Result<()> {
        self.items.insert(id, data.clone());
        Ok(())
    }

    fn create_item(&mut self, _relation: &str, data: &Row) -> Result<i64> {
        let id = self.next_id;
        self.next_id += 1;
        self.items.insert(id, data.clone());
        Ok(id)
    }

    fn delete_item(&mut self, _relation: &str, id: i64) -> Result<()> {
        self.items.remove(&id);
        Ok(())
    }

    fn update_pivot(&mut self, _relation: &str, filter: &Row, data: &Row) -> Result<u64> {
        let mut changed = 0;
        for pivot in &mut self.pivots {
            if filter.iter().all(|(k, v)| pivot.get(k) == Some(v)) {
                pivot.extend(data.clone());
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn insert_pivot(&mut self, _relation: &str, data: &Row) -> Result<()> {
        self.pivots.push(data.clone());
        Ok(())
    }
}

impl SlugLookup for MemoryStore {
    fn slug_taken(&self, _table: &str, _field: &str, slug: &str, _except: Option<i64>) -> Result<bool> {
        Ok(self.slugs.contains(slug))
    }
}
