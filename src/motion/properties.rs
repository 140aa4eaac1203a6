//! Text serialization of motion properties.
//!
//! Every motion type lists the properties it exposes in a [Field] table. Saving walks the
//! table and writes each value as text into a [PropertyMap]; loading walks the same table
//! and only touches properties that are present and parse, so definitions written by an
//! older build load with defaults for anything they do not mention.

use glam::{Vec2, Vec3, Vec4};

use crate::config::{ConfigLines, ConfigWriter};

/// Stands in for the controller's own root object in reference paths.
pub const ROOT_REFERENCE: &str = "{root}";

/// Decimal places used when writing vector components.
pub const VECTOR_PRECISION: usize = 5;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("Property \"{name}\" has an invalid value: \"{value}\"")]
    InvalidValue { name: String, value: String },
}

/// A reference to another object in the actor's hierarchy.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ObjectRef {
    #[default]
    None,
    /// The object the controller itself lives on.
    Root,
    /// A path relative to the root, e.g. `"Armature/Hips/Spine"`.
    Path(String),
}

impl ObjectRef {
    pub fn to_text(&self) -> String {
        match self {
            ObjectRef::None => String::new(),
            ObjectRef::Root => ROOT_REFERENCE.to_owned(),
            ObjectRef::Path(path) => path.clone(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        let text = text.trim().trim_matches('/');
        match text {
            "" => ObjectRef::None,
            ROOT_REFERENCE => ObjectRef::Root,
            path => ObjectRef::Path(path.to_owned()),
        }
    }
}

/// Getter/setter pair for one property of `M`, typed by the kind of value it holds.
pub enum Accessor<M> {
    Text(fn(&M) -> String, fn(&mut M, String)),
    Bool(fn(&M) -> bool, fn(&mut M, bool)),
    Int(fn(&M) -> i32, fn(&mut M, i32)),
    Float(fn(&M) -> f32, fn(&mut M, f32)),
    Vec2(fn(&M) -> Vec2, fn(&mut M, Vec2)),
    Vec3(fn(&M) -> Vec3, fn(&mut M, Vec3)),
    Vec4(fn(&M) -> Vec4, fn(&mut M, Vec4)),
    Reference(fn(&M) -> ObjectRef, fn(&mut M, ObjectRef)),
}

pub struct Field<M> {
    pub name: &'static str,
    pub accessor: Accessor<M>,
}

impl<M> Field<M> {
    pub const fn text(name: &'static str, get: fn(&M) -> String, set: fn(&mut M, String)) -> Self {
        Self {
            name,
            accessor: Accessor::Text(get, set),
        }
    }

    pub const fn bool(name: &'static str, get: fn(&M) -> bool, set: fn(&mut M, bool)) -> Self {
        Self {
            name,
            accessor: Accessor::Bool(get, set),
        }
    }

    pub const fn int(name: &'static str, get: fn(&M) -> i32, set: fn(&mut M, i32)) -> Self {
        Self {
            name,
            accessor: Accessor::Int(get, set),
        }
    }

    pub const fn float(name: &'static str, get: fn(&M) -> f32, set: fn(&mut M, f32)) -> Self {
        Self {
            name,
            accessor: Accessor::Float(get, set),
        }
    }

    pub const fn vec2(name: &'static str, get: fn(&M) -> Vec2, set: fn(&mut M, Vec2)) -> Self {
        Self {
            name,
            accessor: Accessor::Vec2(get, set),
        }
    }

    pub const fn vec3(name: &'static str, get: fn(&M) -> Vec3, set: fn(&mut M, Vec3)) -> Self {
        Self {
            name,
            accessor: Accessor::Vec3(get, set),
        }
    }

    pub const fn vec4(name: &'static str, get: fn(&M) -> Vec4, set: fn(&mut M, Vec4)) -> Self {
        Self {
            name,
            accessor: Accessor::Vec4(get, set),
        }
    }

    pub const fn reference(
        name: &'static str,
        get: fn(&M) -> ObjectRef,
        set: fn(&mut M, ObjectRef),
    ) -> Self {
        Self {
            name,
            accessor: Accessor::Reference(get, set),
        }
    }

    /// Format the current value of this property on `target`.
    pub fn save(&self, target: &M) -> String {
        match &self.accessor {
            Accessor::Text(get, _) => get(target),
            Accessor::Bool(get, _) => get(target).to_string(),
            Accessor::Int(get, _) => get(target).to_string(),
            Accessor::Float(get, _) => get(target).to_string(),
            Accessor::Vec2(get, _) => format_vector(&get(target).to_array()),
            Accessor::Vec3(get, _) => format_vector(&get(target).to_array()),
            Accessor::Vec4(get, _) => format_vector(&get(target).to_array()),
            Accessor::Reference(get, _) => get(target).to_text(),
        }
    }

    /// Parse `text` and store it on `target`. `target` is untouched when parsing fails.
    pub fn load(&self, target: &mut M, text: &str) -> Result<(), PropertyError> {
        let invalid = || PropertyError::InvalidValue {
            name: self.name.to_owned(),
            value: text.to_owned(),
        };

        match &self.accessor {
            Accessor::Text(_, set) => set(target, text.to_owned()),
            Accessor::Bool(_, set) => set(target, parse_bool(text).ok_or_else(invalid)?),
            Accessor::Int(_, set) => set(target, text.trim().parse().map_err(|_| invalid())?),
            Accessor::Float(_, set) => set(target, text.trim().parse().map_err(|_| invalid())?),
            Accessor::Vec2(_, set) => {
                set(target, Vec2::from_array(parse_vector(text).ok_or_else(invalid)?))
            }
            Accessor::Vec3(_, set) => {
                set(target, Vec3::from_array(parse_vector(text).ok_or_else(invalid)?))
            }
            Accessor::Vec4(_, set) => {
                set(target, Vec4::from_array(parse_vector(text).ok_or_else(invalid)?))
            }
            Accessor::Reference(_, set) => set(target, ObjectRef::from_text(text)),
        }

        Ok(())
    }
}

/// Write every field in `fields` into `map`.
pub fn save_fields<M>(fields: &[Field<M>], target: &M, map: &mut PropertyMap) {
    for field in fields {
        map.insert(field.name, field.save(target));
    }
}

/// Load every field in `fields` that is present in `map`.
///
/// Values that fail to parse are skipped with a warning, leaving the current value.
pub fn load_fields<M>(fields: &[Field<M>], target: &mut M, map: &PropertyMap) {
    for field in fields {
        let Some(text) = map.get(field.name) else {
            continue;
        };

        if let Err(err) = field.load(target, text) {
            tracing::warn!("Skipping motion property. ({err})");
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        t if t.eq_ignore_ascii_case("true") || t == "1" => Some(true),
        t if t.eq_ignore_ascii_case("false") || t == "0" => Some(false),
        _ => None,
    }
}

fn format_vector(components: &[f32]) -> String {
    let parts: Vec<String> = components
        .iter()
        .map(|c| format!("{c:.prec$}", prec = VECTOR_PRECISION))
        .collect();
    format!("({})", parts.join(", "))
}

fn parse_vector<const N: usize>(text: &str) -> Option<[f32; N]> {
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))?;

    let mut result = [0.0; N];
    let mut count = 0;
    for part in inner.split(',') {
        if count == N {
            return None;
        }
        result[count] = part.trim().parse().ok()?;
        count += 1;
    }

    (count == N).then_some(result)
}

/// Ordered property name to text value pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, String)>,
}

impl PropertyMap {
    /// Set `name` to `value`, replacing any previous value but keeping its position.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value;
        } else {
            self.entries.push((name.to_owned(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `Name "value"` line per property.
    pub fn to_text(&self) -> String {
        let mut writer = ConfigWriter::default();
        for (key, value) in self.iter() {
            writer.line(key).quoted(value);
        }
        writer.finish()
    }

    pub fn from_text(text: &str) -> Self {
        let mut map = Self::default();
        for line in ConfigLines::parse(text).into_iter() {
            map.insert(&line.key, line.text(0));
        }
        map
    }
}
