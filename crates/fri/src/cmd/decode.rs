use fri_message::{CommandMessage, JointCount, MessageDecoder, MonitoringMessage};

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, message_error, CliResult, SUCCESS};
use crate::output::{print_command, print_monitoring, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let joints =
        JointCount::new(args.joints).map_err(|err| message_error("invalid --joints", err))?;
    let datagram = std::fs::read(&args.file)
        .map_err(|err| io_error(&format!("read {} failed", args.file.display()), err))?;

    if args.command {
        let mut decoder = MessageDecoder::<CommandMessage>::new(joints);
        let message = decoder
            .decode(&datagram)
            .map_err(|err| message_error("decode failed", err))?;
        print_command(message, datagram.len(), format);
    } else {
        let mut decoder = MessageDecoder::<MonitoringMessage>::new(joints);
        let message = decoder
            .decode(&datagram)
            .map_err(|err| message_error("decode failed", err))?;
        print_monitoring(message, datagram.len(), format);
    }

    Ok(SUCCESS)
}
