use crate::config::BridgeConfig;
use crate::descriptor::Revisioned;
use crate::error::{BridgeError, BridgeResult};
use crate::groups::{Changesets, Collections, Commits, Data, Files, Layers, Pages};
use crate::process::{CancellationToken, CommandBridge, Invoke, InvokeOptions};
use crate::resolver;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// Entry point for typed abstract-cli operations.
///
/// Cloning is cheap; clones share the underlying invoker. Deadline and
/// cancellation set with [`with_timeout`](Self::with_timeout) and
/// [`with_cancellation`](Self::with_cancellation) apply to every subprocess
/// the returned client starts, resolution queries included.
#[derive(Debug)]
pub struct AbstractClient<I: Invoke = CommandBridge> {
    invoker: Arc<I>,
    options: InvokeOptions,
}

impl<I: Invoke> Clone for AbstractClient<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
            options: self.options.clone(),
        }
    }
}

impl AbstractClient<CommandBridge> {
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        Ok(Self::from_invoker(CommandBridge::new(config)?))
    }
}

impl<I: Invoke> AbstractClient<I> {
    pub fn from_invoker(invoker: I) -> Self {
        Self {
            invoker: Arc::new(invoker),
            options: InvokeOptions::default(),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
            options: self.options.clone().with_timeout(timeout),
        }
    }

    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
            options: self.options.clone().with_cancellation(cancel),
        }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn commits(&self) -> Commits<'_, I> {
        Commits::new(self)
    }

    pub fn changesets(&self) -> Changesets<'_, I> {
        Changesets::new(self)
    }

    pub fn files(&self) -> Files<'_, I> {
        Files::new(self)
    }

    pub fn pages(&self) -> Pages<'_, I> {
        Pages::new(self)
    }

    pub fn layers(&self) -> Layers<'_, I> {
        Layers::new(self)
    }

    pub fn data(&self) -> Data<'_, I> {
        Data::new(self)
    }

    pub fn collections(&self) -> Collections<'_, I> {
        Collections::new(self)
    }

    /// Replaces a `latest` revision with the newest commit sha.
    pub async fn resolve<D>(&self, descriptor: &D) -> BridgeResult<D>
    where
        D: Revisioned + Display,
    {
        resolver::resolve(self.invoker.as_ref(), descriptor, &self.options).await
    }

    pub(crate) async fn invoke(&self, args: Vec<String>) -> BridgeResult<Value> {
        self.invoker.invoke(args, &self.options).await
    }

    /// Runs `args` and extracts `field` from the response envelope.
    pub(crate) async fn invoke_field<T: DeserializeOwned>(
        &self,
        args: Vec<String>,
        field: &'static str,
    ) -> BridgeResult<T> {
        let response = self.invoke(args).await?;
        take_field(response, field)
    }
}

pub(crate) fn take_field<T: DeserializeOwned>(
    response: Value,
    field: &'static str,
) -> BridgeResult<T> {
    let mut response = response;
    let value = response
        .as_object_mut()
        .and_then(|envelope| envelope.remove(field))
        .ok_or(BridgeError::MissingField { field })?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_field() {
        let commits: Vec<Value> =
            take_field(json!({"commits": [{"sha": "abc"}]}), "commits").unwrap();
        assert_eq!(commits, vec![json!({"sha": "abc"})]);
    }

    #[test]
    fn test_take_field_missing() {
        let result: BridgeResult<Vec<Value>> = take_field(json!({"files": []}), "commits");
        assert!(matches!(
            result,
            Err(BridgeError::MissingField { field: "commits" })
        ));

        let result: BridgeResult<Vec<Value>> = take_field(json!([1, 2]), "commits");
        assert!(matches!(result, Err(BridgeError::MissingField { .. })));
    }

    #[test]
    fn test_take_field_wrong_shape() {
        let result: BridgeResult<Vec<Value>> = take_field(json!({"commits": "nope"}), "commits");
        assert!(matches!(result, Err(BridgeError::Decode(_))));
    }
}
