use crate::console::Console;

/// What the shell should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A named, described behavior bound to a command keyword.
///
/// Handlers receive the console and the raw, untrimmed input line. Errors
/// are returned rather than printed; the shell renders them and keeps going.
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn invoke(&self, console: &dyn Console, input: &str) -> anyhow::Result<Flow>;
}

/// Adapter turning a synchronous closure into a [`Handler`].
pub struct FnHandler<F> {
    name: String,
    description: String,
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&dyn Console, &str) -> anyhow::Result<Flow> + Send + Sync,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            f,
        }
    }
}

#[async_trait::async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&dyn Console, &str) -> anyhow::Result<Flow> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, console: &dyn Console, input: &str) -> anyhow::Result<Flow> {
        (self.f)(console, input)
    }
}
