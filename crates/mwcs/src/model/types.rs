use std::fmt;

use crate::graph::{EdgeId, NodeId};
use crate::signals::SignalId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VarKind {
    Binary,
    /// Bounds may be infinite.
    Continuous { lo: f64, hi: f64 },
}

impl VarKind {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            VarKind::Binary => (0.0, 1.0),
            VarKind::Continuous { lo, hi } => (lo, hi),
        }
    }
}

/// What a variable stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarOrigin {
    Node(NodeId),
    Edge(EdgeId),
    /// Flow over `edge` entering `into`.
    Arc { edge: EdgeId, into: NodeId },
    /// The vertex fed by the virtual root.
    Entry(NodeId),
    Depth(NodeId),
    /// Rank of the entry vertex.
    EntryRank,
    Signal(SignalId),
    Objective,
}

impl fmt::Display for VarOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarOrigin::Node(v) => write!(f, "y{}", v.0),
            VarOrigin::Edge(e) => write!(f, "w{}", e.0),
            VarOrigin::Arc { edge, into } => write!(f, "x{}_{}", edge.0, into.0),
            VarOrigin::Entry(v) => write!(f, "r{}", v.0),
            VarOrigin::Depth(v) => write!(f, "d{}", v.0),
            VarOrigin::EntryRank => write!(f, "rank"),
            VarOrigin::Signal(s) => write!(f, "s{}", s.0),
            VarOrigin::Objective => write!(f, "sum"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    pub kind: VarKind,
    pub origin: VarOrigin,
}

/// Affine expression `Σ coef·var + constant`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(v: VarId) -> Self {
        Self::new().term(v, 1.0)
    }

    pub fn term(mut self, v: VarId, coef: f64) -> Self {
        self.terms.push((v, coef));
        self
    }

    pub fn plus(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn eval(&self, values: &Assignment) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values.get(v))
            .sum::<f64>()
            + self.constant
    }
}

impl FromIterator<(VarId, f64)> for LinExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// `lhs (sense) rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub lhs: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn le(lhs: LinExpr, rhs: f64) -> Self {
        Self {
            lhs,
            sense: Sense::Le,
            rhs,
        }
    }

    pub fn ge(lhs: LinExpr, rhs: f64) -> Self {
        Self {
            lhs,
            sense: Sense::Ge,
            rhs,
        }
    }

    pub fn eq(lhs: LinExpr, rhs: f64) -> Self {
        Self {
            lhs,
            sense: Sense::Eq,
            rhs,
        }
    }

    pub fn holds(&self, values: &Assignment, tol: f64) -> bool {
        let lhs = self.lhs.eval(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// Values indexed by `VarId`.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment(pub Vec<f64>);

impl Assignment {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn get(&self, v: VarId) -> f64 {
        self.0.get(v.0).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, v: VarId, value: f64) {
        if let Some(slot) = self.0.get_mut(v.0) {
            *slot = value;
        }
    }
}

/// Where an assignment breaks a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// Wrong length, out of bounds, or fractional binary.
    Var(VarId),
    Constraint(usize),
}

/// A maximisation MIP.
#[derive(Clone, Debug, Default)]
pub struct Model {
    vars: Vec<Var>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, kind: VarKind, origin: VarOrigin) -> VarId {
        self.vars.push(Var { kind, origin });
        VarId(self.vars.len() - 1)
    }

    pub fn add_constraint(&mut self, c: Constraint) {
        self.constraints.push(c);
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    /// First violated bound or constraint, if any.
    pub fn first_violation(&self, values: &Assignment, tol: f64) -> Option<Violation> {
        if values.0.len() != self.vars.len() {
            return Some(Violation::Var(VarId(values.0.len().min(self.vars.len()))));
        }
        for (i, var) in self.vars.iter().enumerate() {
            let x = values.0[i];
            let (lo, hi) = var.kind.bounds();
            let integral = var.kind != VarKind::Binary || (x - x.round()).abs() <= tol;
            if !x.is_finite() || x < lo - tol || x > hi + tol || !integral {
                return Some(Violation::Var(VarId(i)));
            }
        }
        self.constraints
            .iter()
            .position(|c| !c.holds(values, tol))
            .map(Violation::Constraint)
    }

    pub fn is_feasible(&self, values: &Assignment, tol: f64) -> bool {
        self.first_violation(values, tol).is_none()
    }
}
