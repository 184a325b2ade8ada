//! Small combinators for composing Scala value transforms into source
//! fragments.
//!
//! Conversions the emitters apply to field values (custom-type lifts, enum
//! value extraction, map-entry packing) are kept as data rather than
//! closures so the fragments they produce stay inspectable and testable.

/// One step of a value transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Leaves the expression unchanged.
    Identity,
    /// `expr.method`
    MethodApply(String),
    /// `function(expr)`
    FunctionApply(String),
    /// `(expr op)`, e.g. `(expr != 0)`
    OperatorApply(String),
}

impl Transform {
    pub fn method(name: impl Into<String>) -> Transform {
        Transform::MethodApply(name.into())
    }

    pub fn function(name: impl Into<String>) -> Transform {
        Transform::FunctionApply(name.into())
    }

    pub fn operator(op: impl Into<String>) -> Transform {
        Transform::OperatorApply(op.into())
    }

    fn apply_one(&self, expr: &str) -> String {
        match self {
            Transform::Identity => expr.to_string(),
            Transform::MethodApply(m) => format!("{}.{}", expr, m),
            Transform::FunctionApply(f) => format!("{}({})", f, expr),
            Transform::OperatorApply(op) => format!("({} {})", expr, op),
        }
    }
}

/// A chain of transforms applied left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformChain(Vec<Transform>);

impl TransformChain {
    pub fn identity() -> TransformChain {
        TransformChain(Vec::new())
    }

    pub fn of(t: Transform) -> TransformChain {
        TransformChain(vec![t]).normalized()
    }

    pub fn then(mut self, t: Transform) -> TransformChain {
        self.0.push(t);
        self.normalized()
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_empty()
    }

    fn normalized(mut self) -> TransformChain {
        self.0.retain(|t| *t != Transform::Identity);
        self
    }

    fn fold(&self, expr: &str) -> String {
        self.0
            .iter()
            .fold(expr.to_string(), |acc, t| t.apply_one(&acc))
    }

    /// Folds the chain over `expr`. When `is_collection` is set the chain is
    /// applied element-wise via `.map`; an identity chain elides the `.map`
    /// entirely.
    pub fn apply(&self, expr: &str, is_collection: bool) -> String {
        if self.is_identity() {
            return expr.to_string();
        }
        if is_collection {
            format!("{}.map(__e => {})", expr, self.fold("__e"))
        } else {
            self.fold(expr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(TransformChain::identity().apply("x", false), "x");
        assert_eq!(TransformChain::identity().apply("xs", true), "xs");
    }

    #[test]
    fn test_method_apply() {
        let chain = TransformChain::of(Transform::method("value"));
        assert_eq!(chain.apply("color", false), "color.value");
        assert_eq!(chain.apply("colors", true), "colors.map(__e => __e.value)");
    }

    #[test]
    fn test_function_apply() {
        let chain = TransformChain::of(Transform::function("Color.fromValue"));
        assert_eq!(chain.apply("v", false), "Color.fromValue(v)");
        assert_eq!(chain.apply("vs", true), "vs.map(__e => Color.fromValue(__e))");
    }

    #[test]
    fn test_operator_apply() {
        let chain = TransformChain::of(Transform::operator("!= 0"));
        assert_eq!(chain.apply("x", false), "(x != 0)");
    }

    #[test]
    fn test_compose() {
        let chain = TransformChain::of(Transform::method("value"))
            .then(Transform::function("Duration.ofSeconds"));
        assert_eq!(chain.apply("d", false), "Duration.ofSeconds(d.value)");
        assert_eq!(
            chain.apply("ds", true),
            "ds.map(__e => Duration.ofSeconds(__e.value))"
        );
    }

    #[test]
    fn test_identity_steps_collapse() {
        let chain = TransformChain::of(Transform::Identity)
            .then(Transform::method("toInt"))
            .then(Transform::Identity);
        assert_eq!(chain.apply("v", false), "v.toInt");
        assert!(!chain.is_identity());
        assert!(TransformChain::of(Transform::Identity).is_identity());
    }
}
