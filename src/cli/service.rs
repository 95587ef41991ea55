//! `ak service`: inspect and edit the service catalog.

use serde_json::json;

use crate::cli::{output, Context, ServiceAction, ServiceSpec};
use crate::core::catalog::{self, AuthMethod, Catalog, ServiceDescriptor};
use crate::error::{Error, Result};

pub fn execute(ctx: &Context, action: ServiceAction) -> Result<()> {
    match action {
        ServiceAction::Ls => list(ctx),
        ServiceAction::Show { name } => show(ctx, &name),
        ServiceAction::Add(spec) => add(ctx, spec),
        ServiceAction::Rm { name } => remove(ctx, &name),
    }
}

fn summary(d: &ServiceDescriptor) -> serde_json::Value {
    json!({
        "name": d.name,
        "keyName": d.key_name,
        "description": d.description,
        "testable": d.can_test(),
        "builtIn": d.is_built_in,
    })
}

fn list(ctx: &Context) -> Result<()> {
    let catalog = Catalog::load(ctx.config())?;
    if ctx.json {
        let items: Vec<_> = catalog.all().map(summary).collect();
        return output::json(&items);
    }
    for d in catalog.all() {
        let origin = if d.is_built_in { "" } else { " (user)" };
        let test = if d.can_test() { "testable" } else { "" };
        println!("{:<14} {:<32} {:<9}{}", d.name, d.key_name, test, origin);
    }
    Ok(())
}

fn show(ctx: &Context, name: &str) -> Result<()> {
    let catalog = Catalog::load(ctx.config())?;
    let d = catalog.require(name)?;
    if ctx.json {
        let mut value = serde_json::to_value(d)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("builtIn".to_string(), json!(d.is_built_in));
        }
        return output::json(&value);
    }

    output::section(&d.name);
    output::kv("key", &d.key_name);
    if !d.aliases.is_empty() {
        output::kv("aliases", d.aliases.join(", "));
    }
    if !d.description.is_empty() {
        output::kv("description", &d.description);
    }
    output::kv("source", if d.is_built_in { "built-in" } else { "user" });
    if d.can_test() {
        output::kv("endpoint", format!("{} {}", d.test_method.as_str(), d.test_endpoint));
        output::kv("auth", format!("{:?} in {:?}", d.auth_method, d.auth_location).to_lowercase());
        output::kv("request", crate::core::tester::Probe::redacted(d));
    } else {
        output::kv("testable", "no");
    }
    Ok(())
}

/// Turn command-line fields into a descriptor.
fn descriptor_from(spec: ServiceSpec) -> Result<ServiceDescriptor> {
    let mut d = ServiceDescriptor::new(&spec.name, &spec.key, &spec.description);
    d.aliases = spec.aliases;
    d.test_method = spec.method;
    d.auth_method = spec.auth;
    d.auth_location = spec.location;
    d.auth_parameter = spec.parameter;
    d.auth_prefix = match (spec.prefix, spec.auth) {
        (Some(prefix), _) => prefix,
        (None, AuthMethod::Bearer) => "Bearer ".to_string(),
        (None, _) => String::new(),
    };
    d.test_body = spec.body.unwrap_or_default();
    for header in spec.headers {
        let (k, v) = header
            .split_once(':')
            .ok_or_else(|| Error::Usage(format!("header '{}' is not NAME:VALUE", header)))?;
        d.headers.insert(k.trim().to_string(), v.trim().to_string());
    }
    if let Some(endpoint) = spec.endpoint {
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return Err(Error::Usage(format!("endpoint '{}' is not an http(s) URL", endpoint)));
        }
        d.test_endpoint = endpoint;
        d.testable = true;
    }
    Ok(d)
}

fn add(ctx: &Context, spec: ServiceSpec) -> Result<()> {
    let descriptor = descriptor_from(spec)?;
    let name = descriptor.name.to_ascii_lowercase();
    let testable = descriptor.can_test();
    let replaced = catalog::upsert_user(ctx.config(), descriptor)?;
    ctx.done(
        &format!("{} service {}", if replaced { "updated" } else { "added" }, name),
        json!({ "name": name, "replaced": replaced, "testable": testable }),
    )
}

fn remove(ctx: &Context, name: &str) -> Result<()> {
    catalog::remove_user(ctx.config(), name)?;
    let name = name.to_ascii_lowercase();
    ctx.done(
        &format!("removed service {}", name),
        json!({ "name": name }),
    )
}
