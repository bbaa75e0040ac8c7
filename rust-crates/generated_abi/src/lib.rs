use alloy::{
    primitives::Address,
    sol,
};
use std::str::FromStr;

/// Oracle deployed on Flow EVM. Arguments and result are `uint64`.
pub mod flow_vrf_types {
    use super::*;

    sol! {
        #[derive(Debug)]
        #[sol(rpc)]
        contract RandomnessOracle {
            function getRandomNumber(uint64 min, uint64 max) external view returns (uint64);
            function selectRandomItem(string[] memory items) external view returns (string memory);
        }
    }
}

/// Oracle deployed on Base. Same surface as the Flow one but `uint256` wide.
pub mod base_vrf_types {
    use super::*;

    sol! {
        #[derive(Debug)]
        #[sol(rpc)]
        contract RandomnessOracle {
            function getRandomNumber(uint256 min, uint256 max) external view returns (uint256);
            function selectRandomItem(string[] memory items) external view returns (string memory);
        }
    }
}

pub mod pack_battles_types {
    use super::*;

    sol! {
        #[derive(Debug)]
        #[sol(rpc)]
        contract PackBattles {
            struct Game {
                address creator;
                address player;
                bool isActive;
                bool isCompleted;
                uint256[] availableNFTs;
                uint256 creatorNFTIndex;
                uint256 playerNFTIndex;
            }

            event GameCreated(uint256 gameId, address creator);
            event GameJoined(uint256 gameId, address player);
            event GameCompleted(uint256 gameId, address winner, uint256 winningTokenId, uint256 losingTokenId);

            function createGame() external payable returns (uint256);
            function joinGame(uint256 gameId) external payable;
            function getGame(uint256 gameId) external view returns (Game memory);
            function gameCounter() external view returns (uint256);
            function GAME_FEE() external view returns (uint256);
        }
    }
}

pub mod pack_opening_types {
    use super::*;

    sol! {
        #[derive(Debug)]
        #[sol(rpc)]
        contract PackOpening {
            event PackOpened(uint256 round, address player, uint256 tokenId);

            function openPack() external payable;
            function PACK_COST() external view returns (uint256);
            function getAvailableNFTCount() external view returns (uint256);
            function currentRound() external view returns (uint256);
        }
    }
}

/// Parses a hex contract or account address, tolerating surrounding whitespace.
pub fn parse_address(raw: &str) -> Result<Address, String> {
    let trimmed = raw.trim();
    Address::from_str(trimmed).map_err(|e| format!("invalid address '{raw}': {e}"))
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address__accepts_checksummed_address_with_whitespace() {
        // given
        let raw = "  0x9b4568cE546c1c54f15720783FE1744C20fF1914 ";

        // when
        let address = parse_address(raw).unwrap();

        // then
        assert_eq!(
            address.to_string().to_lowercase(),
            "0x9b4568ce546c1c54f15720783fe1744c20ff1914"
        );
    }

    #[test]
    fn parse_address__rejects_short_input() {
        // given
        let raw = "0x1234";

        // when
        let result = parse_address(raw);

        // then
        assert!(result.is_err());
    }
}
