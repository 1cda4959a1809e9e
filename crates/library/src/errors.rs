use anchor_lang::prelude::*;

pub type VaultResult<T = ()> = std::result::Result<T, ErrorCodes>;

#[error_code]
pub enum ErrorCodes {
    #[msg(LIBRARY_MATH_ERROR)]
    LibraryMathError,

    #[msg(LIBRARY_CASTING_ERROR)]
    LibraryCastingFailure,

    #[msg(LIBRARY_DIVISION_BY_ZERO)]
    LibraryDivisionByZero,

    #[msg(LIBRARY_MUL_DIV_OVERFLOW)]
    LibraryMulDivOverflow,

    #[msg(LIBRARY_DECIMALS_OUT_OF_RANGE)]
    LibraryDecimalsOutOfRange,
}
