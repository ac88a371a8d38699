use std::fmt;

/// The operand stack before one instruction. Top of stack is the last
/// element. Snapshots are immutable once stored in the per-PC arrays and
/// replaced wholesale on update.
#[derive(Clone, PartialEq)]
pub struct Operands<V>(Vec<V>);

impl<V> Operands<V> {
    pub fn empty() -> Self {
        Operands(Vec::new())
    }

    pub fn single(value: V) -> Self {
        Operands(vec![value])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, value: V) {
        self.0.push(value);
    }

    pub fn pop(&mut self) -> Option<V> {
        self.0.pop()
    }

    pub fn peek(&self, depth: usize) -> Option<&V> {
        self.0.len().checked_sub(depth + 1).map(|i| &self.0[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.0.iter().rev()
    }

    pub fn values(&self) -> &[V] {
        &self.0
    }
}

impl<V: fmt::Debug> fmt::Debug for Operands<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().rev()).finish()
    }
}

/// The local-variable slots before one instruction. `None` marks a slot
/// that is dead at this point: never written, overwritten half of a
/// double-slot value, discarded by the dead-variables pass, or a cleared
/// subroutine return-address slot.
#[derive(Clone, PartialEq)]
pub struct Locals<V>(Vec<Option<V>>);

impl<V> Locals<V> {
    pub fn with_slots(slots: u16) -> Self {
        let mut v = Vec::new();
        v.resize_with(slots as usize, || None);
        Locals(v)
    }

    /// Build initial locals from parameter values, padded to `slots`.
    pub fn from_parameters(params: Vec<V>, slots: u16) -> Self {
        let mut v: Vec<Option<V>> = params.into_iter().map(Some).collect();
        if v.len() < slots as usize {
            v.resize_with(slots as usize, || None);
        }
        Locals(v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, slot: u16) -> Option<&V> {
        self.0.get(slot as usize).and_then(|s| s.as_ref())
    }

    pub fn set(&mut self, slot: u16, value: V) {
        if let Some(s) = self.0.get_mut(slot as usize) {
            *s = Some(value);
        }
    }

    /// Mark a slot dead.
    pub fn kill(&mut self, slot: u16) {
        if let Some(s) = self.0.get_mut(slot as usize) {
            *s = None;
        }
    }

    pub fn slots(&self) -> &[Option<V>] {
        &self.0
    }

    pub fn slots_mut(&mut self) -> &mut [Option<V>] {
        &mut self.0
    }
}

impl<V: fmt::Debug> fmt::Debug for Locals<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
