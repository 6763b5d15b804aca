//! Greeting parameter objects.
//!
//! `HelloParam` declares no sources and is therefore read from the request
//! body. `HelloParamQuery` declares a query source on its fields and is read
//! from the query string. Both carry the same constraints.
//!
//! `GreetingParam` is the unconstrained query-bound form behind the plain
//! greeting, answered with a [`Greeting`] phrase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binder::BoundFields;
use crate::error::ShapeError;
use crate::shape::{Bindable, RegistryBuilder, Shape, ShapeRegistry};
use crate::types::FieldSpec;

/// Form of address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Title {
    Mr,
    Mrs,
    Miss,
    Signora,
}

impl Title {
    pub const ALL: [Title; 4] = [Title::Mr, Title::Mrs, Title::Miss, Title::Signora];

    pub fn as_str(&self) -> &'static str {
        match self {
            Title::Mr => "MR",
            Title::Mrs => "MRS",
            Title::Miss => "MISS",
            Title::Signora => "SIGNORA",
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown title \"{0}\"")]
pub struct ParseTitleError(String);

impl FromStr for Title {
    type Err = ParseTitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Title::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseTitleError(s.to_string()))
    }
}

fn title_field() -> FieldSpec {
    FieldSpec::new("title")
        .one_of(Title::ALL.iter().map(Title::as_str))
        .required()
}

fn name_field() -> FieldSpec {
    FieldSpec::new("name").required().non_blank()
}

fn suffix_field() -> FieldSpec {
    FieldSpec::new("suffix")
}

/// Greeting parameters read from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloParam {
    pub title: Option<Title>,
    pub name: Option<String>,
    pub suffix: Option<String>,
}

impl Bindable for HelloParam {
    fn shape() -> Result<Shape, ShapeError> {
        Shape::builder("HelloParam")
            .field(title_field())
            .field(name_field())
            .field(suffix_field())
            .build()
    }
}

impl TryFrom<&BoundFields> for HelloParam {
    type Error = ParseTitleError;

    fn try_from(bound: &BoundFields) -> Result<Self, Self::Error> {
        Ok(Self {
            title: bound.get("title").map(str::parse).transpose()?,
            name: bound.get("name").map(String::from),
            suffix: bound.get("suffix").map(String::from),
        })
    }
}

/// Greeting parameters read from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloParamQuery {
    pub title: Option<Title>,
    pub name: Option<String>,
    pub suffix: Option<String>,
}

impl Bindable for HelloParamQuery {
    fn shape() -> Result<Shape, ShapeError> {
        Shape::builder("HelloParamQuery")
            .field(title_field().query())
            .field(name_field().query())
            .field(suffix_field().query())
            .build()
    }
}

impl TryFrom<&BoundFields> for HelloParamQuery {
    type Error = ParseTitleError;

    fn try_from(bound: &BoundFields) -> Result<Self, Self::Error> {
        let HelloParam {
            title,
            name,
            suffix,
        } = HelloParam::try_from(bound)?;
        Ok(Self {
            title,
            name,
            suffix,
        })
    }
}

/// Optional name for the plain greeting, read from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingParam {
    pub name: Option<String>,
}

impl Bindable for GreetingParam {
    fn shape() -> Result<Shape, ShapeError> {
        Shape::builder("Greeting")
            .field(FieldSpec::new("name").query())
            .build()
    }
}

impl From<&BoundFields> for GreetingParam {
    fn from(bound: &BoundFields) -> Self {
        Self {
            name: bound.get("name").map(String::from),
        }
    }
}

/// Placeholder used when no name is given.
pub const UNKNOWN_NAME: &str = "?????";

/// Response of the plain greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub phrase: String,
}

impl Greeting {
    pub fn for_name(name: Option<&str>) -> Self {
        Self {
            phrase: format!("hello {}", name.unwrap_or(UNKNOWN_NAME)),
        }
    }
}

impl From<&GreetingParam> for Greeting {
    fn from(param: &GreetingParam) -> Self {
        Greeting::for_name(param.name.as_deref())
    }
}

/// Register the greeting shapes on an existing registry builder.
///
/// # Errors
///
/// Returns `ShapeError::DuplicateShape` if a greeting shape name is taken.
pub fn register(builder: RegistryBuilder) -> Result<RegistryBuilder, ShapeError> {
    builder
        .register_type::<HelloParam>()?
        .register_type::<HelloParamQuery>()?
        .register_type::<GreetingParam>()
}

/// Registry holding only the greeting shapes.
///
/// # Errors
///
/// Propagates shape construction errors.
pub fn registry() -> Result<ShapeRegistry, ShapeError> {
    Ok(register(ShapeRegistry::builder())?.build())
}
