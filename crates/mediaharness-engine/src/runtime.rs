use crate::container::ExitedContainer;
use crate::error::Result;
use crate::spec::ContainerSpec;

/// Runs a container to completion.
///
/// Implemented by [`crate::DockerEngine`]; tests substitute scripted runtimes.
pub trait ContainerRuntime {
    /// Start a container from `spec`, wait for it to exit, collect its logs
    /// and remove it.
    fn run(&self, spec: &ContainerSpec) -> Result<ExitedContainer>;
}

impl<R: ContainerRuntime + ?Sized> ContainerRuntime for &R {
    fn run(&self, spec: &ContainerSpec) -> Result<ExitedContainer> {
        (**self).run(spec)
    }
}

impl<R: ContainerRuntime + ?Sized> ContainerRuntime for Box<R> {
    fn run(&self, spec: &ContainerSpec) -> Result<ExitedContainer> {
        (**self).run(spec)
    }
}
