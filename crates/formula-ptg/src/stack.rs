use thiserror::Error;

use crate::ptg::Ptg;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("token {index} pops more operands than are on the stack")]
    Underflow { index: usize },
    #[error("formula leaves {depth} operands on the stack (expected 1)")]
    NotSingular { depth: usize },
}

/// Run `ptgs` against an abstract operand stack and check that exactly one operand remains.
///
/// Only stack depth is tracked. `PtgAttr` jumps are ignored since both branches of an `IF` or
/// `CHOOSE` are present in the stream and consumed by the function token.
pub fn check_stack_balance(ptgs: &[Ptg]) -> Result<(), StackError> {
    let mut depth = 0usize;
    for (index, ptg) in ptgs.iter().enumerate() {
        depth = depth
            .checked_sub(ptg.operand_count())
            .ok_or(StackError::Underflow { index })?;
        depth += ptg.push_count();
    }
    if depth != 1 {
        return Err(StackError::NotSingular { depth });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::PtgClass;
    use crate::ptg::{BinaryOp, PtgAttr};

    #[test]
    fn balanced_sum_with_attr() {
        let ptgs = vec![
            Ptg::Int(1),
            Ptg::Attr(PtgAttr::sum()),
            Ptg::Attr(PtgAttr::new(PtgAttr::SPACE, 0x0100)),
        ];
        assert_eq!(check_stack_balance(&ptgs), Ok(()));
    }

    #[test]
    fn underflow_reports_index() {
        let ptgs = vec![Ptg::Int(1), Ptg::Binary(BinaryOp::Add)];
        assert_eq!(
            check_stack_balance(&ptgs),
            Err(StackError::Underflow { index: 1 })
        );
    }

    #[test]
    fn leftover_operands() {
        let ptgs = vec![Ptg::Int(1), Ptg::Int(2)];
        assert_eq!(
            check_stack_balance(&ptgs),
            Err(StackError::NotSingular { depth: 2 })
        );
        assert_eq!(
            check_stack_balance(&[]),
            Err(StackError::NotSingular { depth: 0 })
        );
    }

    #[test]
    fn user_function_consumes_its_name_operand() {
        let ptgs = vec![
            Ptg::NameX {
                class: PtgClass::Reference,
                ixti: 0,
                name_index: 1,
                reserved: 0,
            },
            Ptg::Int(4),
            Ptg::user_func(PtgClass::Value, 2),
        ];
        assert_eq!(check_stack_balance(&ptgs), Ok(()));
    }
}
