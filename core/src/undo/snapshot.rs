//! Field-level snapshots and diffs of editable objects.
//!
//! A [`Snapshot`] captures an object's fields as a [`FieldValue`] tree when a
//! recording session opens. [`Snapshot::compare`] later captures the object
//! again and produces a [`FieldDiff`]: the ordered list of leaf fields whose
//! values changed, each with its old and new value.
//!
//! A type takes part in diffing by deriving `serde::Serialize` and
//! `serde::Deserialize` and implementing [`Restore`]; the blanket
//! [`Diffable`] implementation does the rest. No per-type reflection code is
//! needed.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::value::{FieldValue, from_field_value, to_field_value};

/// Errors produced while capturing, comparing or patching snapshots.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    /// The object could not be captured.
    #[error("failed to capture object: {0}")]
    Serialize(String),
    /// A patched tree could not be written back into the object.
    #[error("failed to restore object: {0}")]
    Deserialize(String),
    /// A diff path does not exist in the object's current shape.
    #[error("field path not found: {0}")]
    PathNotFound(FieldPath),
}

/// An object whose fields can be captured and written back.
///
/// Object-safe so that hosts can hand out `&dyn Diffable` for heterogeneous
/// objects. Implemented automatically for every
/// `Serialize + DeserializeOwned + Restore` type.
pub trait Diffable {
    /// Captures the current field values.
    fn capture(&self) -> Result<FieldValue, SnapshotError>;

    /// Writes the serialized fields in `value` into the object.
    ///
    /// Fields the capture does not carry are left as they are.
    fn restore(&mut self, value: FieldValue) -> Result<(), SnapshotError>;
}

/// Writes a copy rebuilt from a field tree back into the live object.
///
/// The rebuilt copy only has meaningful values in serialized fields; anything
/// marked `#[serde(skip)]` holds its default. The provided `restore_from`
/// replaces the whole value, which suits plain data. Types with skipped
/// fields (runtime handles, caches) override it and move over only the
/// serialized fields.
///
/// ```ignore
/// impl Restore for Mesh {
///     fn restore_from(&mut self, restored: Self) {
///         self.name = restored.name;
///         self.vertices = restored.vertices;
///         // gpu_handle is #[serde(skip)] and stays
///     }
/// }
/// ```
pub trait Restore: Sized {
    fn restore_from(&mut self, restored: Self) {
        *self = restored;
    }
}

impl<T: Serialize + DeserializeOwned + Restore> Diffable for T {
    fn capture(&self) -> Result<FieldValue, SnapshotError> {
        to_field_value(self)
    }

    fn restore(&mut self, value: FieldValue) -> Result<(), SnapshotError> {
        let rebuilt: T = from_field_value(value)?;
        self.restore_from(rebuilt);
        Ok(())
    }
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named struct field or map key.
    Field(String),
    /// A list element.
    Index(usize),
}

/// Location of a field inside a captured object.
///
/// Displays as `transform.translation[1]`; the empty path (the whole object)
/// displays as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The path of the whole object.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path with a field segment appended.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Returns a new path with an index segment appended.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Resolves this path inside `root`.
    pub fn lookup<'v>(&self, root: &'v FieldValue) -> Option<&'v FieldValue> {
        self.0.iter().try_fold(root, |node, segment| match (segment, node) {
            (PathSegment::Field(name), FieldValue::Map(entries)) => {
                entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            (PathSegment::Index(i), FieldValue::List(items)) => items.get(*i),
            _ => None,
        })
    }

    fn lookup_mut<'v>(&self, root: &'v mut FieldValue) -> Option<&'v mut FieldValue> {
        let mut node = root;
        for segment in &self.0 {
            node = match (segment, node) {
                (PathSegment::Field(name), FieldValue::Map(entries)) => entries
                    .iter_mut()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v)?,
                (PathSegment::Index(i), FieldValue::List(items)) => items.get_mut(*i)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// A single changed field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub path: FieldPath,
    pub old: FieldValue,
    pub new: FieldValue,
}

/// Ordered list of field changes between two captures of the same object.
///
/// Changes are stored in field declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDiff {
    changes: Vec<FieldChange>,
}

impl FieldDiff {
    /// Computes the changes that turn `before` into `after`.
    pub fn between(before: &FieldValue, after: &FieldValue) -> Self {
        let mut changes = Vec::new();
        diff_into(&FieldPath::root(), before, after, &mut changes);
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Iterates over the changed paths in stored order.
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.changes.iter().map(|c| &c.path)
    }

    /// Writes every `new` value into `target`, in stored order.
    pub fn apply_new(&self, target: &mut dyn Diffable) -> Result<(), SnapshotError> {
        self.patch(target, self.changes.iter().map(|c| (&c.path, &c.new)))
    }

    /// Writes every `old` value into `target`, in reverse stored order.
    pub fn apply_old(&self, target: &mut dyn Diffable) -> Result<(), SnapshotError> {
        self.patch(target, self.changes.iter().rev().map(|c| (&c.path, &c.old)))
    }

    fn patch<'a>(
        &self,
        target: &mut dyn Diffable,
        values: impl Iterator<Item = (&'a FieldPath, &'a FieldValue)>,
    ) -> Result<(), SnapshotError> {
        let mut root = target.capture()?;
        for (path, value) in values {
            let slot = path
                .lookup_mut(&mut root)
                .ok_or_else(|| SnapshotError::PathNotFound(path.clone()))?;
            *slot = value.clone();
        }
        target.restore(root)
    }
}

fn diff_into(path: &FieldPath, before: &FieldValue, after: &FieldValue, out: &mut Vec<FieldChange>) {
    match (before, after) {
        (FieldValue::Map(a), FieldValue::Map(b))
            if a.len() == b.len() && a.iter().zip(b).all(|((ka, _), (kb, _))| ka == kb) =>
        {
            for ((key, va), (_, vb)) in a.iter().zip(b) {
                diff_into(&path.field(key.as_str()), va, vb, out);
            }
        }
        (FieldValue::List(a), FieldValue::List(b)) if a.len() == b.len() => {
            for (i, (va, vb)) in a.iter().zip(b).enumerate() {
                diff_into(&path.index(i), va, vb, out);
            }
        }
        _ if before.same_as(after) => {}
        _ => out.push(FieldChange {
            path: path.clone(),
            old: before.clone(),
            new: after.clone(),
        }),
    }
}

/// A captured copy of an object's fields, used as a diff baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    root: FieldValue,
}

impl Snapshot {
    /// Captures the current state of `target`.
    pub fn capture(target: &dyn Diffable) -> Result<Self, SnapshotError> {
        Ok(Self {
            root: target.capture()?,
        })
    }

    /// The captured field tree.
    pub fn value(&self) -> &FieldValue {
        &self.root
    }

    /// Diffs this baseline against the current state of `target`.
    ///
    /// An empty diff means nothing changed.
    pub fn compare(&self, target: &dyn Diffable) -> Result<FieldDiff, SnapshotError> {
        let current = target.capture()?;
        Ok(FieldDiff::between(&self.root, &current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Actor {
        name: String,
        position: [f32; 3],
        tags: Vec<String>,
        visible: bool,
    }

    impl Restore for Actor {}

    /// Carries a runtime handle that never goes through serde.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Mesh {
        name: String,
        vertex_count: u32,
        #[serde(skip)]
        gpu_handle: u64,
    }

    impl Restore for Mesh {
        fn restore_from(&mut self, restored: Self) {
            self.name = restored.name;
            self.vertex_count = restored.vertex_count;
        }
    }

    fn actor() -> Actor {
        Actor {
            name: "crate".into(),
            position: [0.0, 1.0, 2.0],
            tags: vec!["prop".into()],
            visible: true,
        }
    }

    #[test]
    fn unchanged_object_has_empty_diff() {
        let a = actor();
        let snapshot = Snapshot::capture(&a).unwrap();
        assert!(snapshot.compare(&a).unwrap().is_empty());
    }

    #[test]
    fn diff_lists_leaf_changes_in_declaration_order() {
        let mut a = actor();
        let snapshot = Snapshot::capture(&a).unwrap();
        a.visible = false;
        a.position[1] = 5.0;
        a.name = "barrel".into();

        let diff = snapshot.compare(&a).unwrap();
        let paths: Vec<String> = diff.paths().map(|p| p.to_string()).collect();
        assert_eq!(paths, ["name", "position[1]", "visible"]);
        assert_eq!(diff.changes()[1].old, FieldValue::F32(1.0));
        assert_eq!(diff.changes()[1].new, FieldValue::F32(5.0));
    }

    #[test]
    fn resized_list_is_a_single_change() {
        let mut a = actor();
        let snapshot = Snapshot::capture(&a).unwrap();
        a.tags.push("physics".into());

        let diff = snapshot.compare(&a).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.changes()[0].path.to_string(), "tags");
    }

    #[test]
    fn apply_old_then_new_round_trips() {
        let original = actor();
        let mut a = original.clone();
        let snapshot = Snapshot::capture(&a).unwrap();
        a.position = [9.0, 9.0, 9.0];
        a.tags.clear();
        let edited = a.clone();
        let diff = snapshot.compare(&a).unwrap();

        diff.apply_old(&mut a).unwrap();
        assert_eq!(a, original);
        diff.apply_new(&mut a).unwrap();
        assert_eq!(a, edited);
    }

    #[test]
    fn apply_new_twice_is_idempotent() {
        let mut a = actor();
        let snapshot = Snapshot::capture(&a).unwrap();
        a.name = "lamp".into();
        let diff = snapshot.compare(&a).unwrap();

        diff.apply_new(&mut a).unwrap();
        diff.apply_new(&mut a).unwrap();
        assert_eq!(a.name, "lamp");
    }

    #[test]
    fn missing_path_is_reported() {
        let diff = FieldDiff::between(
            &FieldValue::Map(vec![("gone".into(), FieldValue::Bool(true))]),
            &FieldValue::Map(vec![("gone".into(), FieldValue::Bool(false))]),
        );
        let mut a = actor();
        let err = diff.apply_new(&mut a).unwrap_err();
        assert_eq!(err, SnapshotError::PathNotFound(FieldPath::root().field("gone")));
    }

    #[test]
    fn path_display() {
        assert_eq!(FieldPath::root().to_string(), "<root>");
        let path = FieldPath::root().field("transform").field("scale").index(2);
        assert_eq!(path.to_string(), "transform.scale[2]");
    }

    #[test]
    fn lookup_follows_segments() {
        let value = to_field_value(&actor()).unwrap();
        let path = FieldPath::root().field("position").index(2);
        assert_eq!(path.lookup(&value), Some(&FieldValue::F32(2.0)));
        assert_eq!(FieldPath::root().field("nope").lookup(&value), None);
    }

    #[test]
    fn skipped_fields_survive_replay() {
        let mut mesh = Mesh {
            name: "rock".into(),
            vertex_count: 12,
            gpu_handle: 42,
        };
        let snapshot = Snapshot::capture(&mesh).unwrap();
        mesh.name = "boulder".into();
        let diff = snapshot.compare(&mesh).unwrap();
        assert_eq!(diff.len(), 1);

        diff.apply_old(&mut mesh).unwrap();
        assert_eq!(mesh.name, "rock");
        assert_eq!(mesh.gpu_handle, 42);

        diff.apply_new(&mut mesh).unwrap();
        assert_eq!(mesh.name, "boulder");
        assert_eq!(mesh.vertex_count, 12);
        assert_eq!(mesh.gpu_handle, 42);
    }
}
