// Copyright 2019, The Sift Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

/// Assert that an expression matches an enum variant, optionally binding and returning its
/// contents.
///
/// ```edition2021
/// # use sift_test_utils::assert_variant;
///
/// #[derive(Debug)]
/// enum AnyEnum<'a> {
///     Tuple(u8, &'a str),
///     SingleVariant,
/// }
///
/// let e = AnyEnum::Tuple(123, "Hubert etc.");
/// let (age, name) = assert_variant!(e, AnyEnum::Tuple(age, name) => (age, name));
/// assert_eq!(age, 123);
/// assert_eq!(name, "Hubert etc.");
///
/// let e = AnyEnum::SingleVariant;
/// assert_variant!(e, AnyEnum::SingleVariant);
///
/// // Will panic
/// // let e = AnyEnum::SingleVariant;
/// // assert_variant!(e, AnyEnum::Tuple(_, _));
/// ```
#[macro_export]
macro_rules! assert_variant {
    ($value:expr, $pattern:pat $(if $guard:expr)? $(,)?) => {
        match $value {
            $pattern $(if $guard)? => (),
            ref other => panic!("Expected variant '{}', got '{:?}'", stringify!($pattern), other),
        }
    };
    ($value:expr, $pattern:pat => $extract:expr $(,)?) => {
        match $value {
            $pattern => $extract,
            ref other => panic!("Expected variant '{}', got '{:?}'", stringify!($pattern), other),
        }
    };
}

#[cfg(test)]
mod test {
    #[derive(Debug)]
    enum TestEnum {
        Empty,
        Holding(u32),
    }

    #[test]
    fn matches_and_extracts() {
        assert_variant!(TestEnum::Empty, TestEnum::Empty);
        let n = assert_variant!(TestEnum::Holding(42), TestEnum::Holding(n) => n);
        assert_eq!(n, 42);
    }

    #[test]
    #[should_panic(expected = "Expected variant")]
    fn panics_on_mismatch() {
        assert_variant!(TestEnum::Empty, TestEnum::Holding(_));
    }
}
