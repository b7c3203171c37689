// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract CrystalRouter {
        function swapExactETHForTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) payable returns (uint256[] memory amounts);
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) returns (uint256[] memory amounts);
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
    }

    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract ERC20 {
        function balanceOf(address) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use alloy::sol_types::SolCall;

    #[test]
    fn quote_call_roundtrips() {
        let call = CrystalRouter::getAmountsOutCall {
            amountIn: U256::from(1_000_000u64),
            path: vec![Address::from([1u8; 20]), Address::from([2u8; 20])],
        };
        let encoded = call.abi_encode();
        let decoded =
            CrystalRouter::getAmountsOutCall::abi_decode(&encoded).expect("decode quote call");
        assert_eq!(decoded.amountIn, call.amountIn);
        assert_eq!(decoded.path, call.path);
    }

    #[test]
    fn erc20_selectors_are_canonical() {
        let approve = ERC20::approveCall {
            spender: Address::from([1u8; 20]),
            amount: U256::MAX,
        }
        .abi_encode();
        let allowance = ERC20::allowanceCall {
            owner: Address::from([1u8; 20]),
            spender: Address::from([2u8; 20]),
        }
        .abi_encode();

        assert_eq!(hex::encode(&approve[..4]), "095ea7b3");
        assert_eq!(hex::encode(&allowance[..4]), "dd62ed3e");
    }
}
