// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The `dntree-nftset` daemon: adds addresses resolved for configured
//! domains to nftables sets.

mod args;
mod config;
mod domain;
mod run;
mod sets;

use args::Command;

fn main() {
    let args = args::parse();
    match args.command {
        Command::Run(source_args) => run::run(source_args),
        Command::Check(source_args) => run::check(source_args),
    }
}
