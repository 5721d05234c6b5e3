// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Incremental construction of bound values.

use std::any::Any;
use std::sync::Arc;

use crate::core::{CodecError, Result};

/// A decoded feature value on its way into a builder.
pub type AnyValue = Box<dyn Any + Send>;

/// Collects feature values during a decode and produces the final value.
pub trait Builder<T> {
    /// Store the value of feature `index`.
    fn set(&mut self, index: usize, value: AnyValue) -> Result<()>;

    /// Violations of the partially built value. Empty when it is consistent.
    fn verify(&self) -> Vec<String> {
        Vec::new()
    }

    /// Produce the value.
    fn build(self: Box<Self>) -> Result<T>;
}

/// Feature values indexed by declaration order, readable by name.
pub struct Slots {
    names: Arc<[String]>,
    values: Vec<Option<AnyValue>>,
}

impl Slots {
    /// Empty slots for the given feature names.
    pub fn new(names: Arc<[String]>) -> Self {
        let values = names.iter().map(|_| None).collect();
        Self { names, values }
    }

    /// Feature names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Declaration index of `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Store a value; a later value for the same feature replaces the earlier one.
    pub fn set(&mut self, index: usize, value: AnyValue) -> Result<()> {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(CodecError::invariant_violation(format!(
                "feature index {index} out of range for {} features",
                self.names.len()
            ))),
        }
    }

    /// Whether `name` holds a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.index_of(name)
            .and_then(|i| self.values[i].as_ref())
            .is_some()
    }

    /// Borrow the value of `name`.
    pub fn get<F: 'static>(&self, name: &str) -> Option<&F> {
        self.index_of(name)
            .and_then(|i| self.values[i].as_ref())
            .and_then(|value| value.downcast_ref::<F>())
    }

    /// Move the value of `name` out.
    ///
    /// # Errors
    ///
    /// A missing value is a validation failure (without a path; the record
    /// codec fills it in). A value of another type is an invariant violation.
    pub fn take<F: 'static>(&mut self, name: &str) -> Result<F> {
        let index = self.index_of(name).ok_or_else(|| {
            CodecError::invariant_violation(format!("no feature named '{name}'"))
        })?;
        let value = self.values[index]
            .take()
            .ok_or_else(|| {
                CodecError::validation("", vec![format!("missing value for field '{name}'")])
            })?;
        value.downcast::<F>().map(|boxed| *boxed).map_err(|_| {
            CodecError::invariant_violation(format!(
                "field '{name}' does not hold a {}",
                std::any::type_name::<F>()
            ))
        })
    }

    /// Move the value of `name` out, or `F::default()` when it is missing.
    pub fn take_or_default<F: Default + 'static>(&mut self, name: &str) -> Result<F> {
        if self.is_set(name) {
            self.take(name)
        } else {
            Ok(F::default())
        }
    }
}

/// [`Builder`] that fills [`Slots`] and assembles the value with plain functions.
pub struct SlotBuilder<T> {
    slots: Slots,
    assemble: fn(&mut Slots) -> Result<T>,
    verify: fn(&Slots) -> Vec<String>,
}

impl<T: 'static> SlotBuilder<T> {
    /// Create a builder.
    pub fn new(
        names: Arc<[String]>,
        assemble: fn(&mut Slots) -> Result<T>,
        verify: fn(&Slots) -> Vec<String>,
    ) -> Self {
        Self {
            slots: Slots::new(names),
            assemble,
            verify,
        }
    }

    /// Box as a trait object.
    pub fn boxed(self) -> Box<dyn Builder<T>> {
        Box::new(self)
    }
}

impl<T> Builder<T> for SlotBuilder<T> {
    fn set(&mut self, index: usize, value: AnyValue) -> Result<()> {
        self.slots.set(index, value)
    }

    fn verify(&self) -> Vec<String> {
        (self.verify)(&self.slots)
    }

    fn build(mut self: Box<Self>) -> Result<T> {
        (self.assemble)(&mut self.slots)
    }
}
