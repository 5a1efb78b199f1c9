//! Rule language - 정책 조건식
//!
//! TOML 규칙 파일의 `when` 절을 표현합니다.
//!
//! ```toml
//! when = { field = "amount", op = "gt", value = 10000 }
//! when = { any = [
//!     { field = "amount", op = "gt", value = 10000 },
//!     { field = "previous_retries", op = "gte", value = 2 },
//! ] }
//! when = { not = { field = "region", op = "in", value = ["eu", "uk"] } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

// ============================================================================
// Operator
// ============================================================================

/// 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Truthy,
    Falsy,
    In,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Truthy => "truthy",
            Self::Falsy => "falsy",
            Self::In => "in",
        }
    }

    fn is_ordering(&self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }
}

// ============================================================================
// Condition
// ============================================================================

/// 조건식
///
/// 조합자(`all`, `any`, `not`)와 필드 비교로 구성됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    All {
        all: Vec<Condition>,
    },
    Any {
        any: Vec<Condition>,
    },
    Not {
        not: Box<Condition>,
    },
    Compare {
        field: String,
        op: Op,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
}

impl Condition {
    /// 필드 비교 조건 생성
    pub fn compare(field: impl Into<String>, op: Op, value: Option<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// 구조 검증 (로드 시점)
    ///
    /// 연산자와 비교값의 조합이 잘못되면 설명 문자열을 반환합니다.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::All { all: items } | Self::Any { any: items } => {
                items.iter().try_for_each(Condition::validate)
            }
            Self::Not { not } => not.validate(),
            Self::Compare { field, op, value } => {
                if field.trim().is_empty() {
                    return Err("condition field must not be empty".to_string());
                }
                match (op, value) {
                    (Op::Truthy | Op::Falsy, _) => Ok(()),
                    (Op::In, Some(Value::Array(_))) => Ok(()),
                    (Op::In, _) => Err(format!("`in` on `{}` requires an array value", field)),
                    (op, Some(Value::Number(_))) if op.is_ordering() => Ok(()),
                    (op, _) if op.is_ordering() => Err(format!(
                        "`{}` on `{}` requires a numeric value",
                        op.as_str(),
                        field
                    )),
                    (_, Some(_)) => Ok(()),
                    (op, None) => Err(format!("`{}` on `{}` requires a value", op.as_str(), field)),
                }
            }
        }
    }

    /// 입력 객체에 대해 평가
    ///
    /// 항상 값을 반환합니다. 없는 필드는 `null`로 취급하고,
    /// 숫자가 아닌 값의 대소 비교는 false입니다.
    pub fn matches(&self, input: &Map<String, Value>) -> bool {
        match self {
            Self::All { all } => all.iter().all(|c| c.matches(input)),
            Self::Any { any } => any.iter().any(|c| c.matches(input)),
            Self::Not { not } => !not.matches(input),
            Self::Compare { field, op, value } => {
                let actual = input.get(field).unwrap_or(&Value::Null);
                compare(actual, *op, value.as_ref())
            }
        }
    }

    /// 조건이 참조하는 필드 이름들
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::All { all: items } | Self::Any { any: items } => {
                items.iter().for_each(|c| c.collect_fields(out))
            }
            Self::Not { not } => not.collect_fields(out),
            Self::Compare { field, .. } => out.push(field),
        }
    }
}

fn compare(actual: &Value, op: Op, expected: Option<&Value>) -> bool {
    match op {
        Op::Truthy => is_truthy(actual),
        Op::Falsy => !is_truthy(actual),
        Op::Eq => expected.map_or(false, |e| values_equal(actual, e)),
        Op::Ne => expected.map_or(false, |e| !values_equal(actual, e)),
        Op::In => match expected {
            Some(Value::Array(items)) => items.iter().any(|e| values_equal(actual, e)),
            _ => false,
        },
        Op::Gt | Op::Gte | Op::Lt | Op::Lte => {
            let ordering = match (actual.as_f64(), expected.and_then(Value::as_f64)) {
                (Some(a), Some(e)) => a.partial_cmp(&e),
                _ => None,
            };
            match ordering {
                Some(ord) => match op {
                    Op::Gt => ord == Ordering::Greater,
                    Op::Gte => ord != Ordering::Less,
                    Op::Lt => ord == Ordering::Less,
                    _ => ord != Ordering::Greater,
                },
                None => false,
            }
        }
    }
}

/// 숫자는 정수/실수 구분 없이 값으로 비교
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// null, false, 0, 빈 문자열/배열/객체는 거짓
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
