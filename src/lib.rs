// fluent-records: a streaming record processor with an embedded put/filter DSL.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all)]
    grammar
);

pub mod ast;
pub mod cli;
pub mod error;
pub mod eval;
pub mod exec;
pub mod frame;
pub mod interp;
pub mod io;
pub mod logging;
pub mod mlmv;
pub mod overlay;
pub mod parser;
pub mod record;
pub mod value;
