// ==========================================
// 实体数据导入引擎 - 路径组装与剪枝
// ==========================================
// 职责: "a.b.c" 扁平键 → 嵌套对象；递归剪除 null 与空对象
// 规则:
// - 无分隔符的键保留在顶层
// - null 键移除；剪枝后为空的嵌套对象移除
// - 数组与非 null 标量原样保留（空数组不剪）
// - 同一前缀既有标量又有更深路径时，更深路径生效
// ==========================================

use crate::config::config_manager::DEFAULT_PATH_DELIMITER;
use crate::domain::ImportRow;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub struct PathComposer {
    delimiter: String,
}

impl Default for PathComposer {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_DELIMITER)
    }
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            let keeps_branch = matches!(map.get(*last), Some(Value::Object(_))) && !value.is_object();
            if !keeps_branch {
                map.insert(last.to_string(), value);
            }
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

fn flatten_into(prefix: &str, value: &Value, delimiter: &str, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}{}{}", prefix, delimiter, key)
                };
                flatten_into(&path, child, delimiter, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

impl PathComposer {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// 扁平键 → 嵌套对象（键按字典序处理）
    pub fn unflatten(&self, flat: &BTreeMap<String, Value>) -> Value {
        let mut root = Map::new();
        for (key, value) in flat {
            let segments: Vec<&str> = key.split(self.delimiter.as_str()).collect();
            insert_path(&mut root, &segments, value.clone());
        }
        Value::Object(root)
    }

    /// 对 JSON 对象的顶层键执行 unflatten；非对象原样返回
    pub fn unflatten_json(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let flat: BTreeMap<String, Value> =
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                self.unflatten(&flat)
            }
            other => other.clone(),
        }
    }

    /// 嵌套对象 → 扁平键（空嵌套对象作为叶子保留）
    pub fn flatten(&self, value: &Value) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        if let Value::Object(map) = value {
            for (key, child) in map {
                flatten_into(key, child, &self.delimiter, &mut out);
            }
        }
        out
    }

    /// 递归剪枝（根对象自身即使为空也保留）
    pub fn prune(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let pruned: Map<String, Value> = map
                    .into_iter()
                    .filter(|(_, v)| !v.is_null())
                    .filter_map(|(k, v)| match self.prune(v) {
                        Value::Object(child) if child.is_empty() => None,
                        kept => Some((k, kept)),
                    })
                    .collect();
                Value::Object(pruned)
            }
            other => other,
        }
    }

    /// 单行 → 提交载荷
    pub fn compose(&self, row: &ImportRow) -> Value {
        let flat: BTreeMap<String, Value> = row
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        self.prune(self.unflatten(&flat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: Value) -> BTreeMap<String, Value> {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }

    #[test]
    fn test_unflatten_nested_paths() {
        let composer = PathComposer::default();
        let nested = composer.unflatten(&flat(json!({
            "name": "Ann",
            "details.contact_email": "ann@x.io",
            "details.address.city": "Oslo"
        })));

        assert_eq!(
            nested,
            json!({
                "name": "Ann",
                "details": {"contact_email": "ann@x.io", "address": {"city": "Oslo"}}
            })
        );
    }

    #[test]
    fn test_prune_completeness() {
        let composer = PathComposer::default();
        let pruned = composer.prune(json!({"a": null, "b": {"c": null}, "d": 1}));
        assert_eq!(pruned, json!({"d": 1}));
    }

    #[test]
    fn test_prune_keeps_arrays_and_falsy_scalars() {
        let composer = PathComposer::default();
        let pruned = composer.prune(json!({
            "tags": [],
            "zero": 0,
            "off": false,
            "empty": "",
            "deep": {"x": {"y": null}}
        }));
        assert_eq!(pruned, json!({"tags": [], "zero": 0, "off": false, "empty": ""}));
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let composer = PathComposer::default();
        let samples = vec![
            json!({"a.b.c": 1, "a.b.d": null, "e": "x"}),
            json!({"a.b": null, "c": null}),
            json!({"x.y": [1, 2], "x.z": {}, "w": true}),
            json!({"p": 1.5, "q.r.s.t": "deep", "q.r.u": null}),
        ];

        for x in samples {
            let x = flat(x);
            let once = composer.prune(composer.unflatten(&x));
            let twice = composer.unflatten(&flat(
                composer.prune(Value::Object(
                    composer.flatten(&composer.unflatten(&x)).into_iter().collect(),
                )),
            ));
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_deeper_path_wins_over_scalar() {
        let composer = PathComposer::default();
        let nested = composer.unflatten(&flat(json!({"a": 1, "a.b": 2})));
        assert_eq!(nested, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_custom_delimiter() {
        let composer = PathComposer::new("__");
        let nested = composer.unflatten_json(&json!({"contact__email": "a@x.io", "id": 3}));
        assert_eq!(nested, json!({"contact": {"email": "a@x.io"}, "id": 3}));
    }

    #[test]
    fn test_compose_row() {
        let composer = PathComposer::default();
        let mut row = ImportRow::new(0);
        row.set("name", "Ann");
        row.set("details.phone", crate::domain::CellValue::Null);
        row.set("details.age", 42.0);

        assert_eq!(composer.compose(&row), json!({"name": "Ann", "details": {"age": 42}}));
    }
}
