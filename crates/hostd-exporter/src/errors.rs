// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub trait CodedError: std::error::Error {
    fn code(&self) -> &str;
}

/// Implements `Debug` for a [CodedError] so that `{:?}` prints the code followed by the message.
#[macro_export]
macro_rules! impl_coded_debug {
    ($name:ident) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", $crate::errors::CodedError::code(self), self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Error)]
    enum SampleErr {
        #[error("something broke: {0}")]
        Broke(String),
    }

    impl_coded_debug!(SampleErr);

    impl CodedError for SampleErr {
        fn code(&self) -> &str {
            match self {
                SampleErr::Broke(_) => "[H-TST-0001]",
            }
        }
    }

    #[test]
    fn debug_prefixes_code() {
        let err = SampleErr::Broke("disk".into());
        assert_eq!(format!("{err:?}"), "[H-TST-0001] something broke: disk");
    }
}
