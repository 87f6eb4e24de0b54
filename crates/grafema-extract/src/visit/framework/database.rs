//! Database overlay: `db.query(sql)` / ORM-style `Model.find*`/`create`/
//! `update`/`delete` calls (spec §4.2 "Framework overlays").

use std::collections::HashMap;

use tree_sitter::Node;

use crate::visit::framework::{first_string_arg, member_call, push};
use crate::visit::VisitCtx;

const ORM_METHODS: &[&str] = &[
    "find", "findOne", "findAll", "findById", "create", "update", "delete", "destroy", "save",
];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some((object, method)) = member_call(ctx, node) else {
        return false;
    };

    if method == "query" {
        let sql = first_string_arg(ctx, node).unwrap_or_else(|| "<dynamic>".to_string());
        let mut attrs = HashMap::new();
        attrs.insert("receiver".to_string(), object);
        attrs.insert("sql".to_string(), sql.clone());
        push(ctx, node, "database", "raw-query", &sql, attrs);
        return true;
    }

    if ORM_METHODS.contains(&method.as_str()) && object.chars().next().is_some_and(|c| c.is_uppercase()) {
        let mut attrs = HashMap::new();
        attrs.insert("model".to_string(), object.clone());
        attrs.insert("operation".to_string(), method.clone());
        push(ctx, node, "database", "orm", &format!("{object}.{method}"), attrs);
        return true;
    }

    false
}
