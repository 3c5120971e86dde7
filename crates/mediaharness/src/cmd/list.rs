use crate::cmd::run::{images, select};
use crate::cmd::ListArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_catalog, OutputFormat};

pub fn run(args: ListArgs, format: OutputFormat) -> CliResult<i32> {
    let scenarios = select(&[], &args.tool)?;
    print_catalog(&scenarios, &images(&args.images), format);
    Ok(SUCCESS)
}
