//! Student identity: a roster entry may carry up to three id fields that all
//! refer to the same child. `IdentifierIndex` maps every one of them back.

use serde::{Deserialize, Serialize};

use crate::de::null_as_default;
use std::collections::{BTreeSet, HashMap};

/// Roster entry as delivered by the student store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, alias = "className", alias = "class", deserialize_with = "null_as_default")]
    pub class_id: String,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub parent_email: Option<String>,
}

impl Student {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        class_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            class_id: class_id.into(),
            ..Default::default()
        }
    }

    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Non-empty id fields in priority order: `id`, `studentId`, `uid`
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        [&self.id, &self.student_id, &self.uid]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Resolved identity of one student for a reconciliation run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub primary_id: String,
    /// Always contains `primary_id`
    pub alternate_ids: BTreeSet<String>,
    pub name: String,
    pub class_id: String,
}

impl StudentRef {
    /// `None` when the student carries no usable id at all.
    pub fn from_student(student: &Student) -> Option<Self> {
        let mut ids = student.identifiers();
        let primary_id = ids.next()?.to_string();
        let mut alternate_ids: BTreeSet<String> = ids.map(str::to_string).collect();
        alternate_ids.insert(primary_id.clone());
        Some(Self {
            primary_id,
            alternate_ids,
            name: student.name.trim().to_string(),
            class_id: student.class_id.trim().to_string(),
        })
    }
}

/// Reverse lookup from any known identifier to its student.
///
/// Built once per run and passed by reference. If two students share an id
/// value the later one wins the mapping.
#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    students: Vec<StudentRef>,
    by_id: HashMap<String, usize>,
}

impl IdentifierIndex {
    pub fn build(students: &[Student]) -> Self {
        let mut index = Self::default();
        for student in students {
            if let Some(r) = StudentRef::from_student(student) {
                index.insert(r);
            }
        }
        index
    }

    pub fn insert(&mut self, student: StudentRef) {
        let slot = match self
            .students
            .iter()
            .position(|s| s.primary_id == student.primary_id)
        {
            Some(i) => {
                self.students[i] = student;
                i
            }
            None => {
                self.students.push(student);
                self.students.len() - 1
            }
        };
        for id in &self.students[slot].alternate_ids {
            self.by_id.insert(id.clone(), slot);
        }
    }

    pub fn resolve(&self, id: &str) -> Option<&StudentRef> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        self.by_id.get(id).map(|&i| &self.students[i])
    }

    /// First candidate that resolves, in the order given
    pub fn resolve_any<'a, I>(&self, candidates: I) -> Option<&StudentRef>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        candidates
            .into_iter()
            .flatten()
            .find_map(|id| self.resolve(id))
    }

    pub fn students(&self) -> &[StudentRef] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ids_resolve_to_same_student() {
        let s = Student::new("doc-1", "Rafi", "Five")
            .with_student_id("STU-001")
            .with_uid("auth-xyz");
        let index = IdentifierIndex::build(&[s]);

        let a = index.resolve("doc-1").unwrap();
        let b = index.resolve("STU-001").unwrap();
        let c = index.resolve("auth-xyz").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.primary_id, "doc-1");
        assert_eq!(a.alternate_ids.len(), 3);
    }

    #[test]
    fn test_duplicate_and_empty_ids_collapse() {
        let mut s = Student::new("doc-1", "Rafi", "Five").with_student_id("doc-1");
        s.uid = Some("   ".into());
        let r = StudentRef::from_student(&s).unwrap();
        assert_eq!(r.alternate_ids.len(), 1);
        assert!(r.alternate_ids.contains("doc-1"));
    }

    #[test]
    fn test_student_without_ids_is_skipped() {
        let s = Student {
            name: "Ghost".into(),
            ..Default::default()
        };
        assert!(StudentRef::from_student(&s).is_none());
        assert!(IdentifierIndex::build(&[s]).is_empty());
    }

    #[test]
    fn test_shared_id_later_student_wins() {
        let a = Student::new("doc-1", "Rafi", "Five").with_uid("shared");
        let b = Student::new("doc-2", "Mita", "Six").with_uid("shared");
        let index = IdentifierIndex::build(&[a, b]);
        assert_eq!(index.resolve("shared").unwrap().primary_id, "doc-2");
        assert_eq!(index.resolve("doc-1").unwrap().name, "Rafi");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_resolve_any_uses_first_match() {
        let index = IdentifierIndex::build(&[Student::new("doc-1", "Rafi", "Five").with_uid("u1")]);
        let hit = index.resolve_any([None, Some("nope"), Some("u1")]).unwrap();
        assert_eq!(hit.primary_id, "doc-1");
        assert!(index.resolve_any([Some("nope"), None]).is_none());
    }

    #[test]
    fn test_student_json_aliases() {
        let s: Student = serde_json::from_str(
            r#"{"id":"d1","uid":"u1","name":"Rafi","className":"Five"}"#,
        )
        .unwrap();
        assert_eq!(s.class_id, "Five");
        assert_eq!(s.identifiers().collect::<Vec<_>>(), vec!["d1", "u1"]);
    }
}
